use smallvec::{SmallVec, smallvec};

use crate::{
    model::routing_model::{NodeRole, RoutingModel},
    solver::{
        ls::r#move::{LocalSearchOperator, MovedNodes},
        solution::{
            route_change::{RouteChange, RouteChanges},
            route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

/// **Pair Relocate**
///
/// Takes a pickup and its delivery out of their route and inserts both into another route,
/// the pickup in front of the node at `pickup_to` and the delivery in front of the node at
/// `delivery_to` (`pickup_to <= delivery_to`, positions of the target route before the move).
#[derive(Debug, Clone)]
pub struct PairRelocateOperator {
    params: PairRelocateParams,
}

#[derive(Debug, Clone)]
pub struct PairRelocateParams {
    pub from_route_id: RouteIdx,
    pub to_route_id: RouteIdx,
    pub pickup_from: usize,
    pub delivery_from: usize,
    pub pickup_to: usize,
    pub delivery_to: usize,
}

impl PairRelocateOperator {
    pub fn new(params: PairRelocateParams) -> Self {
        debug_assert!(params.from_route_id != params.to_route_id);
        debug_assert!(params.pickup_from < params.delivery_from);
        debug_assert!(params.pickup_to <= params.delivery_to);
        Self { params }
    }
}

impl LocalSearchOperator for PairRelocateOperator {
    fn generate_moves<C>(
        model: &RoutingModel,
        solution: &WorkingSolution,
        (r1, r2): (RouteIdx, RouteIdx),
        mut consumer: C,
    ) where
        C: FnMut(Self),
    {
        if r1 == r2 || !model.has_pickup_delivery_constraint() {
            return;
        }

        let from_route = solution.route(r1);
        let to_route = solution.route(r2);

        for (pickup_from, &node) in from_route.nodes().iter().enumerate() {
            let NodeRole::Pickup { delivery } = model.node_role(node) else {
                continue;
            };
            let Some((_, delivery_from)) = solution.position_of(delivery) else {
                continue;
            };

            for pickup_to in 0..=to_route.len() {
                for delivery_to in pickup_to..=to_route.len() {
                    consumer(PairRelocateOperator::new(PairRelocateParams {
                        from_route_id: r1,
                        to_route_id: r2,
                        pickup_from,
                        delivery_from,
                        pickup_to,
                        delivery_to,
                    }));
                }
            }
        }
    }

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        let PairRelocateParams {
            from_route_id,
            to_route_id,
            pickup_from,
            delivery_from,
            pickup_to,
            delivery_to,
        } = self.params;

        let from_route = solution.route(from_route_id);
        let to_route = solution.route(to_route_id);
        let pickup = from_route.node(pickup_from);
        let delivery = from_route.node(delivery_from);

        smallvec![
            RouteChange::new(from_route_id)
                .range(from_route_id, 0, pickup_from)
                .range(from_route_id, pickup_from + 2, delivery_from)
                .range(from_route_id, delivery_from + 2, from_route.end_position()),
            RouteChange::new(to_route_id)
                .range(to_route_id, 0, pickup_to)
                .node(pickup)
                .range(to_route_id, pickup_to + 1, delivery_to)
                .node(delivery)
                .range(to_route_id, delivery_to + 1, to_route.end_position()),
        ]
    }

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        let route = solution.route(self.params.from_route_id);
        smallvec![
            (route.node(self.params.pickup_from), self.params.to_route_id),
            (route.node(self.params.delivery_from), self.params.to_route_id),
        ]
    }

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        smallvec![self.params.from_route_id, self.params.to_route_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::constraints::constraint::{compute_solution_score, default_constraints},
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_pair_moves_together() {
        let model = test_utils::create_line_model(
            7,
            2,
            TestModelOptions {
                distance_capacity: Some(1_000),
                pickups_deliveries: vec![(5, 2)],
                ..TestModelOptions::default()
            },
        );
        let mut solution = test_utils::create_test_working_solution(
            &model,
            vec![vec![1, 5, 3, 2], vec![4, 6]],
        );

        let op = PairRelocateOperator::new(PairRelocateParams {
            from_route_id: RouteIdx::new(0),
            to_route_id: RouteIdx::new(1),
            pickup_from: 1,
            delivery_from: 3,
            pickup_to: 1,
            delivery_to: 2,
        });
        let before = solution.objective();
        let delta = op.evaluate(&solution).unwrap().cost_delta;
        op.apply(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 3]);
        assert_eq!(test_utils::route_nodes(&solution, 1), vec![4, 5, 6, 2]);
        assert_eq!(solution.objective(), before + delta);

        let (score, _) = compute_solution_score(&default_constraints(), &solution);
        assert_eq!(score.hard_score, 0);
    }

    #[test]
    fn test_generation_count() {
        let model = test_utils::create_line_model(
            6,
            2,
            TestModelOptions {
                distance_capacity: Some(1_000),
                pickups_deliveries: vec![(1, 2)],
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2], vec![3, 4]]);

        let mut count = 0;
        PairRelocateOperator::generate_moves(
            &model,
            &solution,
            (RouteIdx::new(0), RouteIdx::new(1)),
            |_| count += 1,
        );
        assert_eq!(count, 3 + 2 + 1);
    }
}
