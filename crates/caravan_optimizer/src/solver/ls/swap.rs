use smallvec::{SmallVec, smallvec};

use crate::{
    model::routing_model::{NodeRole, RoutingModel},
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

/// **Intra-Route Swap**
///
/// Exchanges the nodes at `first` and `second` (`first < second`).
///
/// ```text
/// BEFORE: ... (A) -> [first] -> (B) ... (X) -> [second] -> (Y) ...
/// AFTER:  ... (A) -> [second] -> (B) ... (X) -> [first] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct SwapOperator {
    params: SwapOperatorParams,
}

#[derive(Debug, Clone)]
pub struct SwapOperatorParams {
    pub route_id: RouteIdx,
    pub first: usize,
    pub second: usize,
}

impl SwapOperator {
    pub fn new(params: SwapOperatorParams) -> Self {
        debug_assert!(params.first < params.second);
        Self { params }
    }
}

/// The node at `first` moves later to `second`, the node at `second` moves earlier to `first`.
fn keeps_precedence(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    first: usize,
    second: usize,
) -> bool {
    let route = solution.route(route_id);
    let model = solution.model();

    let a = route.node(first);
    let b = route.node(second);

    let a_ok = match model.node_role(a) {
        NodeRole::Pickup { .. } => {
            sibling_position(solution, route_id, a).is_none_or(|delivery| delivery > second)
        }
        _ => true,
    };

    let b_ok = match model.node_role(b) {
        NodeRole::Delivery { .. } => {
            sibling_position(solution, route_id, b).is_none_or(|pickup| pickup < first)
        }
        _ => true,
    };

    a_ok && b_ok
}

impl LocalSearchOperator for SwapOperator {
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

        for first in 0..route.len() {
            for second in first + 1..route.len() {
                if keeps_precedence(solution, r1, first, second) {
                    consumer(SwapOperator::new(SwapOperatorParams {
                        route_id: r1,
                        first,
                        second,
                    }));
                }
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let SwapOperatorParams {
            route_id,
            first,
            second,
        } = self.params;
        let route = solution.route(route_id);
        let end = route.end_position();

        let (a, b) = (first + 1, second + 1);

        smallvec![
            RouteChange::new(route_id)
                .range(route_id, 0, a - 1)
                .node(route.node(second))
                .range(route_id, a + 1, b - 1)
                .node(route.node(first))
                .range(route_id, b + 1, end)
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let route = solution.route(self.params.route_id);
        smallvec![
            (route.node(self.params.first), self.params.route_id),
            (route.node(self.params.second), self.params.route_id),
        ]
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
    fn test_swap_adjacent_and_distant() {
        let model = test_utils::create_line_model(6, 1, TestModelOptions::default());
        let route_id = RouteIdx::new(0);
        let mut solution =
            test_utils::create_test_working_solution(&model, vec![vec![2, 1, 3, 5, 4]]);

        let op = SwapOperator::new(SwapOperatorParams {
            route_id,
            first: 0,
            second: 1,
        });
        assert_eq!(op.evaluate(&solution).unwrap().cost_delta, -2);
        op.apply(&mut solution);

        SwapOperator::new(SwapOperatorParams {
            route_id,
            first: 2,
            second: 4,
        })
        .apply(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn test_swap_never_inverts_a_pair() {
        let model = test_utils::create_line_model(
            5,
            1,
            TestModelOptions {
                distance_capacity: Some(1_000),
                pickups_deliveries: vec![(1, 3)],
                ..TestModelOptions::default()
            },
        );
        let solution = test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3, 4]]);
        let route_id = RouteIdx::new(0);

        SwapOperator::generate_moves(&model, &solution, (route_id, route_id), |op| {
            assert!(!(op.params.first == 0 && op.params.second >= 2));
            assert!(!(op.params.first <= 0 && op.params.second == 2));
        });
    }
}
