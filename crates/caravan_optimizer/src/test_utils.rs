use std::sync::Arc;

use crate::{
    model::routing_model::{RoutingModel, RoutingModelBuilder},
    problem::{data_model::RoutingDataModelBuilder, distance_matrix::DistanceMatrix, node::NodeIdx},
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
};

#[derive(Default, Clone)]
pub struct TestModelOptions {
    pub vehicle_capacities: Option<Vec<i64>>,
    pub demands: Option<Vec<i64>>,
    pub pickups_deliveries: Vec<(usize, usize)>,
    /// Adds a "Distance" dimension with this capacity.
    pub distance_capacity: Option<i64>,
    pub span_coefficient: i64,
}

pub fn create_test_model(
    points: Vec<(f64, f64)>,
    num_vehicles: usize,
    options: TestModelOptions,
) -> Arc<RoutingModel> {
    let matrix = DistanceMatrix::from_euclidean(&points);
    let mut data_builder = RoutingDataModelBuilder::from_matrix(matrix, num_vehicles, 0);

    if let Some(capacities) = options.vehicle_capacities.clone() {
        data_builder.with_vehicle_capacities(capacities);
    }
    if let Some(demands) = options.demands.clone() {
        data_builder.with_demands(demands);
    }
    if !options.pickups_deliveries.is_empty() {
        data_builder.with_pickups_and_deliveries(options.pickups_deliveries.clone());
    }

    let data = Arc::new(data_builder.build().unwrap());
    let mut builder = RoutingModelBuilder::new(Arc::clone(&data));
    let distance = builder.register_distance_callback();

    if let Some(capacity) = options.distance_capacity {
        builder
            .add_dimension(distance, 0, capacity, true, "Distance")
            .unwrap();
        builder
            .set_global_span_cost_coefficient("Distance", options.span_coefficient)
            .unwrap();
    }

    if let Some(demands) = options.demands {
        let demand = builder.register_demand_callback(demands).unwrap();
        builder
            .add_dimension_with_vehicle_capacity(demand, 0, true, "Capacity")
            .unwrap();
    }

    if !options.pickups_deliveries.is_empty() {
        builder
            .add_pickup_and_delivery_constraint("Distance")
            .unwrap();
    }

    Arc::new(builder.build().unwrap())
}

/// Nodes on a horizontal line, node `i` at `x = i`. Node 0 is the depot.
pub fn create_line_model(
    num_nodes: usize,
    num_vehicles: usize,
    options: TestModelOptions,
) -> Arc<RoutingModel> {
    let points = (0..num_nodes).map(|i| (i as f64, 0.0)).collect();
    create_test_model(points, num_vehicles, options)
}

/// Nodes on a grid, row by row, node 0 at the origin is the depot.
pub fn create_grid_model(
    rows: usize,
    cols: usize,
    num_vehicles: usize,
    options: TestModelOptions,
) -> Arc<RoutingModel> {
    let points = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col as f64 * 10.0, row as f64 * 10.0)))
        .collect();
    create_test_model(points, num_vehicles, options)
}

pub fn create_test_working_solution(
    model: &Arc<RoutingModel>,
    routes: Vec<Vec<usize>>,
) -> WorkingSolution {
    WorkingSolution::with_routes(
        Arc::clone(model),
        routes
            .into_iter()
            .map(|nodes| nodes.into_iter().map(NodeIdx::new).collect())
            .collect(),
    )
}

pub fn route_nodes(solution: &WorkingSolution, route: usize) -> Vec<usize> {
    solution
        .route(RouteIdx::new(route))
        .nodes()
        .iter()
        .map(|node| node.get())
        .collect()
}
