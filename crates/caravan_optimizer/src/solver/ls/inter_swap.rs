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

/// **Inter-Route Swap**
///
/// Exchanges the node at `first` in `first_route_id` with the node at `second` in
/// `second_route_id`. Paired nodes are left alone.
///
/// ```text
/// BEFORE:
///    R1: ... (A) -> [first] -> (B) ...
///    R2: ... (X) -> [second] -> (Y) ...
///
/// AFTER:
///    R1: ... (A) -> [second] -> (B) ...
///    R2: ... (X) -> [first] -> (Y) ...
/// ```
#[derive(Debug, Clone)]
pub struct InterSwapOperator {
    params: InterSwapOperatorParams,
}

#[derive(Debug, Clone)]
pub struct InterSwapOperatorParams {
    pub first_route_id: RouteIdx,
    pub second_route_id: RouteIdx,
    pub first: usize,
    pub second: usize,
}

impl InterSwapOperator {
    pub fn new(params: InterSwapOperatorParams) -> Self {
        debug_assert!(params.first_route_id != params.second_route_id);
        Self { params }
    }
}

impl LocalSearchOperator for InterSwapOperator {
    fn generate_moves<C>(
        model: &RoutingModel,
        solution: &WorkingSolution,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        // symmetric, one direction is enough
        if r1 >= r2 {
            return;
        }

        let first_route = solution.route(r1);
        let second_route = solution.route(r2);

        for first in 0..first_route.len() {
            if model.node_role(first_route.node(first)).is_paired() {
                continue;
            }

            for second in 0..second_route.len() {
                if model.node_role(second_route.node(second)).is_paired() {
                    continue;
                }

                consumer(InterSwapOperator::new(InterSwapOperatorParams {
                    first_route_id: r1,
                    second_route_id: r2,
                    first,
                    second,
                }));
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let InterSwapOperatorParams {
            first_route_id,
            second_route_id,
            first,
            second,
        } = self.params;

        let first_route = solution.route(first_route_id);
        let second_route = solution.route(second_route_id);

        smallvec![
            RouteChange::new(first_route_id)
                .range(first_route_id, 0, first)
                .node(second_route.node(second))
                .range(first_route_id, first + 2, first_route.end_position()),
            RouteChange::new(second_route_id)
                .range(second_route_id, 0, second)
                .node(first_route.node(first))
                .range(second_route_id, second + 2, second_route.end_position()),
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let first = solution
            .route(self.params.first_route_id)
            .node(self.params.first);
        let second = solution
            .route(self.params.second_route_id)
            .node(self.params.second);

        smallvec![
            (first, self.params.second_route_id),
            (second, self.params.first_route_id),
        ]
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.first_route_id, self.params.second_route_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, TestModelOptions};

    #[test]
    fn test_inter_swap() {
        let model = test_utils::create_line_model(5, 2, TestModelOptions::default());
        let mut solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 4], vec![3, 2]]);

        let op = InterSwapOperator::new(InterSwapOperatorParams {
            first_route_id: RouteIdx::new(0),
            second_route_id: RouteIdx::new(1),
            first: 1,
            second: 1,
        });
        let before = solution.objective();
        let delta = op.evaluate(&solution).unwrap().cost_delta;
        op.apply(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2]);
        assert_eq!(test_utils::route_nodes(&solution, 1), vec![3, 4]);
        assert_eq!(solution.objective(), before + delta);
        assert!(delta < 0);
    }

    #[test]
    fn test_inter_swap_respects_capacity() {
        let model = test_utils::create_line_model(
            5,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![2, 3]),
                demands: Some(vec![0, 1, 1, 2, 1]),
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2], vec![3, 4]]);

        let swap = |first, second| {
            InterSwapOperator::new(InterSwapOperatorParams {
                first_route_id: RouteIdx::new(0),
                second_route_id: RouteIdx::new(1),
                first,
                second,
            })
        };

        // node 3 weighs 2 and does not fit next to node 2 in the first vehicle
        assert!(swap(0, 0).evaluate(&solution).is_none());
        assert!(swap(0, 1).evaluate(&solution).is_some());
    }
}
