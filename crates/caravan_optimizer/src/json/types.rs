use std::sync::Arc;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::{ModelError, ModelResult},
    model::routing_model::{RoutingModel, RoutingModelBuilder},
    problem::{
        data_model::RoutingDataModelBuilder,
        distance_matrix::{Distance, DistanceMatrix},
    },
    solver::search_params::SearchParameters,
};

pub const DISTANCE_DIMENSION: &str = "Distance";
pub const CAPACITY_DIMENSION: &str = "Capacity";

/// Routing problem as read from a JSON file.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename = "RoutingProblem")]
pub struct JsonRoutingProblem {
    /// Exactly one of `distance_matrix` and `coordinates` must be given.
    pub distance_matrix: Option<Vec<Vec<Distance>>>,
    /// Euclidean distances are computed between these points.
    pub coordinates: Option<Vec<[f64; 2]>>,
    pub vehicles: usize,
    #[serde(default)]
    pub depot: usize,
    pub vehicle_capacities: Option<Vec<i64>>,
    pub demands: Option<Vec<i64>>,
    #[serde(default)]
    pub pickups_deliveries: Vec<[usize; 2]>,
    pub distance_dimension: Option<JsonDistanceDimension>,
    #[serde(default)]
    pub search: JsonSearch,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename = "DistanceDimension")]
pub struct JsonDistanceDimension {
    pub capacity: i64,
    #[serde(default)]
    pub slack_max: i64,
    #[serde(default = "default_start_at_zero")]
    pub start_at_zero: bool,
    #[serde(default)]
    pub global_span_cost_coefficient: i64,
}

fn default_start_at_zero() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields, rename = "Search")]
pub struct JsonSearch {
    pub first_solution_strategy: Option<String>,
    pub local_search_metaheuristic: Option<String>,
    pub time_limit_seconds: Option<f64>,
}

impl JsonRoutingProblem {
    fn distance_matrix(&self) -> ModelResult<DistanceMatrix> {
        match (&self.distance_matrix, &self.coordinates) {
            (Some(rows), None) => DistanceMatrix::new(rows.clone()),
            (None, Some(coordinates)) => {
                let points = coordinates.iter().map(|&[x, y]| (x, y)).collect::<Vec<_>>();
                Ok(DistanceMatrix::from_euclidean(&points))
            }
            (Some(_), Some(_)) => Err(ModelError::InvalidModel(
                "both distance_matrix and coordinates were given".to_string(),
            )),
            (None, None) => Err(ModelError::InvalidModel(
                "either distance_matrix or coordinates is required".to_string(),
            )),
        }
    }

    /// Builds the routing model: a "Capacity" dimension when demands are given and a
    /// "Distance" dimension when configured. Pairs are anchored on the distance dimension.
    #[instrument(skip_all)]
    pub fn build_model(&self) -> ModelResult<RoutingModel> {
        let matrix = self.distance_matrix()?;
        let mut data_builder =
            RoutingDataModelBuilder::from_matrix(matrix, self.vehicles, self.depot);

        if let Some(capacities) = &self.vehicle_capacities {
            data_builder.with_vehicle_capacities(capacities.clone());
        }
        if let Some(demands) = &self.demands {
            data_builder.with_demands(demands.clone());
        }
        if !self.pickups_deliveries.is_empty() {
            data_builder.with_pickups_and_deliveries(
                self.pickups_deliveries
                    .iter()
                    .map(|&[pickup, delivery]| (pickup, delivery))
                    .collect(),
            );
        }

        let data = Arc::new(data_builder.build()?);
        let mut builder = RoutingModelBuilder::new(data);
        let distance = builder.register_distance_callback();

        if let Some(dimension) = &self.distance_dimension {
            builder.add_dimension(
                distance,
                dimension.slack_max,
                dimension.capacity,
                dimension.start_at_zero,
                DISTANCE_DIMENSION,
            )?;
            builder.set_global_span_cost_coefficient(
                DISTANCE_DIMENSION,
                dimension.global_span_cost_coefficient,
            )?;
        }

        if let Some(demands) = &self.demands {
            let demand = builder.register_demand_callback(demands.clone())?;
            builder.add_dimension_with_vehicle_capacity(demand, 0, true, CAPACITY_DIMENSION)?;
        }

        if !self.pickups_deliveries.is_empty() {
            if self.distance_dimension.is_none() {
                return Err(ModelError::InvalidPickupDelivery(
                    "pickup and delivery pairs need a distance_dimension".to_string(),
                ));
            }
            builder.add_pickup_and_delivery_constraint(DISTANCE_DIMENSION)?;
        }

        builder.build()
    }

    pub fn search_parameters(&self) -> ModelResult<SearchParameters> {
        let mut params = SearchParameters::default();

        if let Some(strategy) = &self.search.first_solution_strategy {
            params.first_solution_strategy = strategy.parse()?;
        }
        if let Some(metaheuristic) = &self.search.local_search_metaheuristic {
            params.local_search_metaheuristic = Some(metaheuristic.parse()?);
        }
        if let Some(seconds) = self.search.time_limit_seconds {
            let time_limit = SignedDuration::try_from_secs_f64(seconds)
                .ok()
                .filter(|duration| !duration.is_negative())
                .ok_or_else(|| {
                    ModelError::InvalidModel(format!("invalid time limit of {seconds} seconds"))
                })?;
            params.time_limit = Some(time_limit);
        }

        Ok(params)
    }
}
