use smallvec::{SmallVec, smallvec};

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        ls::{
            precedence::segment_move_keeps_precedence,
            r#move::{LocalSearchOperator, MovedNodes},
        },
        solution::{
            route_change::{RouteChange, RouteChanges},
            route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

/// **Intra-Route Relocate**
///
/// Moves the node at `from` in front of the node currently at `to`.
///
/// ```text
/// BEFORE:
///    Route: ... (A) -> [from] -> (C) ... (X) -> (Y) ...
///
/// AFTER:
///    Route: ... (A) -> (C) ... (X) -> [from] -> (Y) ...
///
/// Edges Removed: (A->from), (from->C), (X->Y)
/// Edges Created: (A->C),    (X->from), (from->Y)
/// ```
#[derive(Debug, Clone)]
pub struct RelocateOperator {
    params: RelocateOperatorParams,
}

#[derive(Debug, Clone)]
pub struct RelocateOperatorParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl RelocateOperator {
    pub fn new(params: RelocateOperatorParams) -> Self {
        debug_assert!(
            params.from != params.to && params.from + 1 != params.to,
            "relocate to the same place"
        );

        Self { params }
    }
}

impl LocalSearchOperator for RelocateOperator {
    fn generate_moves<C>(
        _model: &RoutingModel,
        solution: &WorkingSolution,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 != r2 {
            return;
        }

        let route = solution.route(r1);

        for from in 0..route.len() {
            for to in 0..=route.len() {
                if to == from || to == from + 1 {
                    continue;
                }

                if !segment_move_keeps_precedence(solution, r1, from, from, to) {
                    continue;
                }

                consumer(RelocateOperator::new(RelocateOperatorParams {
                    route_id: r1,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let RelocateOperatorParams { route_id, from, to } = self.params;
        let route = solution.route(route_id);
        let end = route.end_position();
        let node = route.node(from);

        // extended positions
        let f = from + 1;
        let t = to + 1;

        let change = if t < f {
            RouteChange::new(route_id)
                .range(route_id, 0, t - 1)
                .node(node)
                .range(route_id, t, f - 1)
                .range(route_id, f + 1, end)
        } else {
            RouteChange::new(route_id)
                .range(route_id, 0, f - 1)
                .range(route_id, f + 1, t - 1)
                .node(node)
                .range(route_id, t, end)
        };

        smallvec![change]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let route = solution.route(self.params.route_id);
        smallvec![(route.node(self.params.from), self.params.route_id)]
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.route_id]
    }
}
