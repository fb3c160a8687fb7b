use crate::{
    model::routing_model::{NodeRole, RoutingModel},
    solver::{
        score::{Score, ScoreLevel},
        solution::route::WorkingSolutionRoute,
    },
};

use super::route_constraint::RouteConstraint;

/// Counts pairs of a route that are split across vehicles, out of order, or whose
/// cumuls on the anchor dimension decrease from pickup to delivery.
#[derive(Clone)]
pub struct PickupDeliveryConstraint;

impl RouteConstraint for PickupDeliveryConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn compute_score(&self, model: &RoutingModel, route: &WorkingSolutionRoute) -> Score {
        let Some(anchor) = model.pickup_delivery_dimension() else {
            return Score::zero();
        };

        let position_of = |node| {
            route
                .nodes()
                .iter()
                .position(|&candidate| candidate == node)
        };

        let mut violations = 0;
        for (position, &node) in route.nodes().iter().enumerate() {
            match model.node_role(node) {
                NodeRole::Pickup { delivery } => match position_of(delivery) {
                    Some(delivery_position) if delivery_position > position => {
                        // Extended positions are shifted by the start depot.
                        if route.cumul(anchor, position + 1)
                            > route.cumul(anchor, delivery_position + 1)
                        {
                            violations += 1;
                        }
                    }
                    _ => violations += 1,
                },
                NodeRole::Delivery { pickup } => {
                    if position_of(pickup).is_none() {
                        violations += 1;
                    }
                }
                NodeRole::Regular => {}
            }
        }

        Score::of(self.score_level(), violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::solution::route_id::RouteIdx,
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_pickup_delivery_violations() {
        let model = test_utils::create_line_model(
            5,
            2,
            TestModelOptions {
                distance_capacity: Some(100),
                pickups_deliveries: vec![(1, 3), (2, 4)],
                ..TestModelOptions::default()
            },
        );

        let constraint = PickupDeliveryConstraint;

        let valid = test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3, 4]]);
        assert_eq!(
            constraint.compute_score(&model, valid.route(RouteIdx::new(0))),
            Score::zero()
        );

        // 3 before 1, and 2 without 4
        let invalid =
            test_utils::create_test_working_solution(&model, vec![vec![3, 1, 2], vec![4]]);
        assert_eq!(
            constraint.compute_score(&model, invalid.route(RouteIdx::new(0))),
            Score::hard(2)
        );
        assert_eq!(
            constraint.compute_score(&model, invalid.route(RouteIdx::new(1))),
            Score::hard(1)
        );
    }
}
