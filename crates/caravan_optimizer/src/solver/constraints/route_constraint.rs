use crate::{
    model::routing_model::RoutingModel,
    solver::{
        score::{Score, ScoreLevel},
        solution::route::WorkingSolutionRoute,
    },
};

use super::{
    dimension_capacity_constraint::DimensionCapacityConstraint,
    pickup_delivery_constraint::PickupDeliveryConstraint,
};

pub trait RouteConstraint {
    fn score_level(&self) -> ScoreLevel;
    fn compute_score(&self, model: &RoutingModel, route: &WorkingSolutionRoute) -> Score;
}

#[derive(Clone)]
pub enum RouteConstraintType {
    DimensionCapacity(DimensionCapacityConstraint),
    PickupDelivery(PickupDeliveryConstraint),
}

impl RouteConstraintType {
    pub fn constraint_name(&self) -> &'static str {
        match self {
            RouteConstraintType::DimensionCapacity(_) => "dimension_capacity",
            RouteConstraintType::PickupDelivery(_) => "pickup_delivery",
        }
    }
}

impl RouteConstraint for RouteConstraintType {
    fn score_level(&self) -> ScoreLevel {
        match self {
            RouteConstraintType::DimensionCapacity(c) => c.score_level(),
            RouteConstraintType::PickupDelivery(c) => c.score_level(),
        }
    }

    fn compute_score(&self, model: &RoutingModel, route: &WorkingSolutionRoute) -> Score {
        match self {
            RouteConstraintType::DimensionCapacity(c) => c.compute_score(model, route),
            RouteConstraintType::PickupDelivery(c) => c.compute_score(model, route),
        }
    }
}
