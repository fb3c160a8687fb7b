use smallvec::{SmallVec, smallvec};

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        ls::r#move::{LocalSearchOperator, MovedNodes},
        solution::{
            route_change::{RouteChange, RouteChanges},
            route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

/// **Inter-Route Relocate**
///
/// Moves the node at `from` in `from_route_id` in front of the node at `to` in `to_route_id`.
/// Pickups and deliveries stay with their sibling and are moved by [`PairRelocateOperator`].
///
/// ```text
/// BEFORE:
///    R1: ... (A) -> [from] -> (B) ...
///    R2: ... (X) -> (Y) ...
///
/// AFTER:
///    R1: ... (A) -> (B) ...
///    R2: ... (X) -> [from] -> (Y) ...
/// ```
///
/// [`PairRelocateOperator`]: crate::solver::ls::pair_relocate::PairRelocateOperator
#[derive(Debug, Clone)]
pub struct InterRelocateOperator {
    params: InterRelocateParams,
}

#[derive(Debug, Clone)]
pub struct InterRelocateParams {
    pub from_route_id: RouteIdx,
    pub to_route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl InterRelocateOperator {
    pub fn new(params: InterRelocateParams) -> Self {
        debug_assert!(params.from_route_id != params.to_route_id);
        Self { params }
    }
}

impl LocalSearchOperator for InterRelocateOperator {
    fn generate_moves<C>(
        model: &RoutingModel,
        solution: &WorkingSolution,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 == r2 {
            return;
        }

        let from_route = solution.route(r1);
        let to_route = solution.route(r2);

        for from in 0..from_route.len() {
            if model.node_role(from_route.node(from)).is_paired() {
                continue;
            }

            for to in 0..=to_route.len() {
                consumer(InterRelocateOperator::new(InterRelocateParams {
                    from_route_id: r1,
                    to_route_id: r2,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let InterRelocateParams {
            from_route_id,
            to_route_id,
            from,
            to,
        } = self.params;

        let from_route = solution.route(from_route_id);
        let to_route = solution.route(to_route_id);
        let node = from_route.node(from);

        smallvec![
            RouteChange::new(from_route_id)
                .range(from_route_id, 0, from)
                .range(from_route_id, from + 2, from_route.end_position()),
            RouteChange::new(to_route_id)
                .range(to_route_id, 0, to)
                .node(node)
                .range(to_route_id, to + 1, to_route.end_position()),
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let node = solution
            .route(self.params.from_route_id)
            .node(self.params.from);
        smallvec![(node, self.params.to_route_id)]
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.from_route_id, self.params.to_route_id]
    }
}
