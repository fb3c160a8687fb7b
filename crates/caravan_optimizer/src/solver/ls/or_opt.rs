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

const MIN_SEGMENT_LENGTH: usize = 2;
const MAX_SEGMENT_LENGTH: usize = 3;

/// **Intra-Route Or-Opt**
///
/// Moves the chain `from..from + count` in front of the node currently at `to`, keeping
/// its direction.
///
/// ```text
/// BEFORE: ... (A) -> [S1 -> S2] -> (B) ... (X) -> (Y) ...
/// AFTER:  ... (A) -> (B) ... (X) -> [S1 -> S2] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct OrOptOperator {
    params: OrOptOperatorParams,
}

#[derive(Debug, Clone)]
pub struct OrOptOperatorParams {
    pub route_id: RouteIdx,
    pub from: usize,
    pub count: usize,
    pub to: usize,
}

impl OrOptOperator {
    pub fn new(params: OrOptOperatorParams) -> Self {
        debug_assert!(params.to < params.from || params.to > params.from + params.count);
        Self { params }
    }

    fn last(&self) -> usize {
        self.params.from + self.params.count - 1
    }
}

impl LocalSearchOperator for OrOptOperator {
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

        for count in MIN_SEGMENT_LENGTH..=MAX_SEGMENT_LENGTH {
            if count >= route.len() {
                break;
            }

            for from in 0..=route.len() - count {
                let last = from + count - 1;

                for to in (0..from).chain(last + 2..=route.len()) {
                    if !segment_move_keeps_precedence(solution, r1, from, last, to) {
                        continue;
                    }

                    consumer(OrOptOperator::new(OrOptOperatorParams {
                        route_id: r1,
                        from,
                        count,
                        to,
                    }));
                }
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let route_id = self.params.route_id;
        let end = solution.route(route_id).end_position();

        // extended positions
        let s = self.params.from + 1;
        let e = self.last() + 1;
        let t = self.params.to + 1;

        let change = if t < s {
            RouteChange::new(route_id)
                .range(route_id, 0, t - 1)
                .range(route_id, s, e)
                .range(route_id, t, s - 1)
                .range(route_id, e + 1, end)
        } else {
            RouteChange::new(route_id)
                .range(route_id, 0, s - 1)
                .range(route_id, e + 1, t - 1)
                .range(route_id, s, e)
                .range(route_id, t, end)
        };

        smallvec![change]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let route = solution.route(self.params.route_id);
        (self.params.from..=self.last())
            .map(|position| (route.node(position), self.params.route_id))
            .collect()
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.route_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, TestModelOptions};

    #[test]
    fn test_or_opt_moves_chain() {
        let model = test_utils::create_line_model(7, 1, TestModelOptions::default());
        let mut solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 5, 6, 2, 3, 4]]);
        let before = solution.objective();

        let op = OrOptOperator::new(OrOptOperatorParams {
            route_id: RouteIdx::new(0),
            from: 1,
            count: 2,
            to: 6,
        });
        let delta = op.evaluate(&solution).unwrap().cost_delta;
        op.apply(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(solution.objective(), 12);
        assert_eq!(before + delta, 12);

        let op = OrOptOperator::new(OrOptOperatorParams {
            route_id: RouteIdx::new(0),
            from: 3,
            count: 3,
            to: 0,
        });
        op.apply(&mut solution);
        assert_eq!(test_utils::route_nodes(&solution, 0), vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn test_or_opt_generation_bounds() {
        let model = test_utils::create_line_model(4, 1, TestModelOptions::default());
        let solution = test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3]]);
        let route_id = RouteIdx::new(0);

        let mut moves = Vec::new();
        OrOptOperator::generate_moves(&model, &solution, (route_id, route_id), |op| {
            moves.push((op.params.from, op.params.count, op.params.to));
        });

        // chains of 2 in a route of 3: [1, 2] to the end, [2, 3] to the front
        assert_eq!(moves, vec![(0, 2, 3), (1, 2, 0)]);
    }
}
