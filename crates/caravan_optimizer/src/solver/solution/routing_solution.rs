use serde::Serialize;

use crate::{
    model::dimension::DimensionIdx,
    problem::{node::NodeIdx, vehicle::VehicleIdx},
    solver::{
        score::{Score, ScoreAnalysis},
        solution::{assignment::Assignment, working_solution::WorkingSolution},
        statistics::SearchStatistics,
    },
};

#[derive(Serialize, Debug, Clone)]
pub struct DimensionCumuls {
    pub dimension: String,
    /// One value per visited node, depots included.
    pub values: Vec<i64>,
}

#[derive(Serialize, Debug, Clone)]
pub struct VehicleRoute {
    pub vehicle: VehicleIdx,
    /// Visited nodes, starting and ending at the depot.
    pub nodes: Vec<NodeIdx>,
    pub distance: f64,
    pub cost: i64,
    pub cumuls: Vec<DimensionCumuls>,
}

impl VehicleRoute {
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct DimensionTotal {
    pub dimension: String,
    /// Sum of the end cumuls of all vehicles.
    pub total: i64,
    pub max_end_cumul: i64,
    pub span_cost: i64,
}

/// Final result of a successful solve.
#[derive(Serialize, Debug, Clone)]
pub struct RoutingSolution {
    pub assignment: Assignment,
    pub routes: Vec<VehicleRoute>,
    pub dimensions: Vec<DimensionTotal>,
    pub objective: i64,
    pub transport_cost: i64,
    /// Full re-evaluation of the assignment: no hard violations, soft score equal to the objective.
    pub score: Score,
    pub score_analysis: ScoreAnalysis,
    /// The search was cut short by the time limit or a stop request.
    pub time_limited: bool,
    pub statistics: SearchStatistics,
}

impl RoutingSolution {
    pub fn new(
        solution: &WorkingSolution,
        score_analysis: ScoreAnalysis,
        time_limited: bool,
        statistics: SearchStatistics,
    ) -> Self {
        let model = solution.model();

        let routes = solution
            .routes()
            .iter()
            .map(|route| {
                let nodes = (0..=route.end_position())
                    .map(|position| route.ext_node(position))
                    .collect::<Vec<_>>();
                let distance = if route.is_empty() {
                    0.0
                } else {
                    nodes
                        .windows(2)
                        .map(|arc| model.data().distance(arc[0], arc[1]))
                        .sum()
                };

                let cumuls = model
                    .dimensions()
                    .iter()
                    .enumerate()
                    .map(|(index, dimension)| DimensionCumuls {
                        dimension: dimension.name().to_string(),
                        values: (0..=route.end_position())
                            .map(|position| route.cumul(DimensionIdx::new(index), position))
                            .collect(),
                    })
                    .collect();

                VehicleRoute {
                    vehicle: route.vehicle_id(),
                    nodes,
                    distance,
                    cost: route.cost(),
                    cumuls,
                }
            })
            .collect();

        let dimensions = model
            .dimensions()
            .iter()
            .enumerate()
            .map(|(index, dimension)| {
                let dimension_id = DimensionIdx::new(index);
                let end_cumuls = solution
                    .routes()
                    .iter()
                    .map(|route| route.end_cumul(dimension_id));

                DimensionTotal {
                    dimension: dimension.name().to_string(),
                    total: end_cumuls.clone().sum(),
                    max_end_cumul: end_cumuls.max().unwrap_or(0),
                    span_cost: solution.span_cost_of(dimension_id),
                }
            })
            .collect();

        RoutingSolution {
            assignment: Assignment::from_solution(solution),
            routes,
            dimensions,
            objective: solution.objective(),
            transport_cost: solution.transport_cost(),
            score: score_analysis.total_score(),
            score_analysis,
            time_limited,
            statistics,
        }
    }

    pub fn route(&self, vehicle: VehicleIdx) -> &VehicleRoute {
        &self.routes[vehicle.get()]
    }

    pub fn used_vehicles(&self) -> usize {
        self.routes.iter().filter(|route| !route.is_empty()).count()
    }
}
