use smallvec::{SmallVec, smallvec};

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        ls::{
            precedence::sibling_position,
            r#move::{LocalSearchOperator, MovedNodes},
        },
        solution::{
            route_change::{RouteChange, RouteChanges},
            route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

/// **Intra-Route 2-Opt**
///
/// Reverses the segment between `from` and `to` (inclusive).
///
/// ```text
/// BEFORE: ... (A) -> [from] -> (B) -> (C) -> [to] -> (D) ...
/// AFTER:  ... (A) -> [to] -> (C) -> (B) -> [from] -> (D) ...
/// ```
#[derive(Debug, Clone)]
pub struct TwoOptOperator {
    params: TwoOptParams,
}

#[derive(Debug, Clone)]
pub struct TwoOptParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub to: usize,
}

impl TwoOptOperator {
    pub fn new(params: TwoOptParams) -> Self {
        debug_assert!(params.from < params.to);
        Self { params }
    }
}

impl LocalSearchOperator for TwoOptOperator {
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
            for to in from + 1..route.len() {
                // once a whole pair is inside the segment, every longer segment contains it too
                let closes_pair = sibling_position(solution, r1, route.node(to))
                    .is_some_and(|position| position >= from && position < to);
                if closes_pair {
                    break;
                }

                consumer(TwoOptOperator::new(TwoOptParams {
                    route_id: r1,
                    from,
                    to,
                }));
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let TwoOptParams { route_id, from, to } = self.params;
        let end = solution.route(route_id).end_position();

        smallvec![
            RouteChange::new(route_id)
                .range(route_id, 0, from)
                .reversed(route_id, from + 1, to + 1)
                .range(route_id, to + 2, end)
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let route = solution.route(self.params.route_id);
        smallvec![
            (route.node(self.params.from), self.params.route_id),
            (route.node(self.params.to), self.params.route_id),
        ]
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.route_id]
    }
}
