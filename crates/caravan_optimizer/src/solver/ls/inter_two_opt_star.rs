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

/// **Inter-Route 2-Opt\***
///
/// Cuts both routes after an extended position and exchanges their tails.
///
/// ```text
/// BEFORE:
///    R1: (S1) -> ... -> [A] -> (B) -> ... -> (E1)
///    R2: (S2) -> ... -> [X] -> (Y) -> ... -> (E2)
///
/// AFTER:
///    R1: (S1) -> ... -> [A] -> (Y) -> ... -> (E1)
///    R2: (S2) -> ... -> [X] -> (B) -> ... -> (E2)
/// ```
///
/// A cut is only allowed where no pickup waits for its delivery, so pairs never get split.
#[derive(Debug, Clone)]
pub struct InterTwoOptStarOperator {
    params: InterTwoOptStarOperatorParams,
}

#[derive(Debug, Clone)]
pub struct InterTwoOptStarOperatorParams {
    pub first_route_id: RouteIdx,
    pub second_route_id: RouteIdx,
    /// Last extended position kept in the first route.
    pub first_cut: usize,
    /// Last extended position kept in the second route.
    pub second_cut: usize,
}

impl InterTwoOptStarOperator {
    pub fn new(params: InterTwoOptStarOperatorParams) -> Self {
        debug_assert!(params.first_route_id != params.second_route_id);
        Self { params }
    }
}

impl LocalSearchOperator for InterTwoOptStarOperator {
    fn generate_moves<C>(
        _model: &RoutingModel,
        solution: &WorkingSolution,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 >= r2 {
            return;
        }

        let first_route = solution.route(r1);
        let second_route = solution.route(r2);

        for first_cut in 0..=first_route.len() {
            if first_route.open_pairs(first_cut) != 0 {
                continue;
            }

            for second_cut in 0..=second_route.len() {
                if second_route.open_pairs(second_cut) != 0 {
                    continue;
                }

                // both tails empty or both heads empty: nothing changes hands
                let no_tails = first_cut == first_route.len() && second_cut == second_route.len();
                if no_tails {
                    continue;
                }

                consumer(InterTwoOptStarOperator::new(InterTwoOptStarOperatorParams {
                    first_route_id: r1,
                    second_route_id: r2,
                    first_cut,
                    second_cut,
                }));
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let InterTwoOptStarOperatorParams {
            first_route_id,
            second_route_id,
            first_cut,
            second_cut,
        } = self.params;

        let first_route = solution.route(first_route_id);
        let second_route = solution.route(second_route_id);
        let first_end = first_route.end_position();
        let second_end = second_route.end_position();

        smallvec![
            RouteChange::new(first_route_id)
                .range(first_route_id, 0, first_cut)
                .range(second_route_id, second_cut + 1, second_route.len())
                .range(first_route_id, first_end, first_end),
            RouteChange::new(second_route_id)
                .range(second_route_id, 0, second_cut)
                .range(first_route_id, first_cut + 1, first_route.len())
                .range(second_route_id, second_end, second_end),
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let params = &self.params;
        let first_route = solution.route(params.first_route_id);
        let second_route = solution.route(params.second_route_id);

        let mut moved = MovedNodes::new();
        if params.first_cut < first_route.len() {
            moved.push((first_route.node(params.first_cut), params.second_route_id));
        }
        if params.second_cut < second_route.len() {
            moved.push((second_route.node(params.second_cut), params.first_route_id));
        }
        moved
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.first_route_id, self.params.second_route_id]
    }
}
