use crate::{
    model::{dimension::DimensionIdx, routing_model::RoutingModel},
    solver::{
        score::{Score, ScoreLevel},
        solution::route::WorkingSolutionRoute,
    },
};

use super::route_constraint::RouteConstraint;

/// Amount by which cumuls exceed the vehicle capacity of their dimension.
#[derive(Clone)]
pub struct DimensionCapacityConstraint;

impl RouteConstraint for DimensionCapacityConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn compute_score(&self, model: &RoutingModel, route: &WorkingSolutionRoute) -> Score {
        let vehicle_id = route.vehicle_id();

        let excess = model
            .dimensions()
            .iter()
            .enumerate()
            .map(|(index, dimension)| {
                let capacity = dimension.capacity(vehicle_id);
                (0..=route.end_position())
                    .map(|position| route.cumul(DimensionIdx::new(index), position))
                    .map(|cumul| (cumul - capacity).max(0))
                    .max()
                    .unwrap_or(0)
            })
            .sum();

        Score::of(self.score_level(), excess)
    }
}
