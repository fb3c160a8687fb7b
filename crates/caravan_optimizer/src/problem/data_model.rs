use crate::{
    error::{ModelError, ModelResult},
    problem::{
        distance_matrix::{Cost, Distance, DistanceMatrix},
        node::NodeIdx,
        pickup_delivery::PickupDeliveryPair,
        vehicle::{Vehicle, VehicleIdx},
    },
};

/// Validated input of a routing problem: stops, fleet, depot and side data.
#[derive(Debug)]
pub struct RoutingDataModel {
    distance_matrix: DistanceMatrix,
    vehicles: Vec<Vehicle>,
    depot: NodeIdx,
    demands: Option<Vec<i64>>,
    pickups_deliveries: Vec<PickupDeliveryPair>,
    /// Pair index by node, for nodes taking part in a pickup and delivery.
    pair_of_node: Vec<Option<usize>>,
}

impl RoutingDataModel {
    pub fn num_nodes(&self) -> usize {
        self.distance_matrix.num_locations()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn depot(&self) -> NodeIdx {
        self.depot
    }

    pub fn distance_matrix(&self) -> &DistanceMatrix {
        &self.distance_matrix
    }

    #[inline(always)]
    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.distance_matrix.distance(from, to)
    }

    #[inline(always)]
    pub fn cost(&self, from: NodeIdx, to: NodeIdx) -> Cost {
        self.distance_matrix.cost(from, to)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn vehicle_capacities(&self) -> Option<Vec<i64>> {
        self.vehicles
            .iter()
            .map(|vehicle| vehicle.capacity())
            .collect()
    }

    pub fn has_capacities(&self) -> bool {
        self.demands.is_some()
    }

    pub fn demands(&self) -> Option<&[i64]> {
        self.demands.as_deref()
    }

    pub fn demand(&self, node: NodeIdx) -> i64 {
        self.demands.as_ref().map_or(0, |demands| demands[node])
    }

    pub fn total_demand(&self) -> i64 {
        self.demands
            .as_ref()
            .map_or(0, |demands| demands.iter().sum())
    }

    pub fn pickups_deliveries(&self) -> &[PickupDeliveryPair] {
        &self.pickups_deliveries
    }

    pub fn has_pickups_deliveries(&self) -> bool {
        !self.pickups_deliveries.is_empty()
    }

    /// Index in [`Self::pickups_deliveries`] of the pair the node belongs to.
    pub fn pair_of(&self, node: NodeIdx) -> Option<usize> {
        self.pair_of_node[node]
    }

    /// Nodes other than the depot, in ascending order.
    pub fn stops(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.num_nodes())
            .map(NodeIdx::new)
            .filter(|&node| node != self.depot)
    }
}

/// Collects the raw inputs of a [`RoutingDataModel`] and validates them on `build`.
pub struct RoutingDataModelBuilder {
    distance_matrix: MatrixInput,
    num_vehicles: usize,
    depot: usize,
    vehicle_capacities: Option<Vec<i64>>,
    demands: Option<Vec<i64>>,
    pickups_deliveries: Option<Vec<(usize, usize)>>,
}

enum MatrixInput {
    Rows(Vec<Vec<Distance>>),
    Matrix(DistanceMatrix),
}

impl RoutingDataModelBuilder {
    pub fn new(distance_matrix: Vec<Vec<Distance>>, num_vehicles: usize, depot: usize) -> Self {
        RoutingDataModelBuilder {
            distance_matrix: MatrixInput::Rows(distance_matrix),
            num_vehicles,
            depot,
            vehicle_capacities: None,
            demands: None,
            pickups_deliveries: None,
        }
    }

    pub fn from_matrix(distance_matrix: DistanceMatrix, num_vehicles: usize, depot: usize) -> Self {
        RoutingDataModelBuilder {
            distance_matrix: MatrixInput::Matrix(distance_matrix),
            num_vehicles,
            depot,
            vehicle_capacities: None,
            demands: None,
            pickups_deliveries: None,
        }
    }

    pub fn with_vehicle_capacities(&mut self, capacities: Vec<i64>) -> &mut Self {
        self.vehicle_capacities = Some(capacities);
        self
    }

    pub fn with_demands(&mut self, demands: Vec<i64>) -> &mut Self {
        self.demands = Some(demands);
        self
    }

    pub fn with_pickups_and_deliveries(&mut self, pairs: Vec<(usize, usize)>) -> &mut Self {
        self.pickups_deliveries = Some(pairs);
        self
    }

    pub fn build(self) -> ModelResult<RoutingDataModel> {
        let distance_matrix = match self.distance_matrix {
            MatrixInput::Rows(rows) => DistanceMatrix::new(rows)?,
            MatrixInput::Matrix(matrix) => matrix,
        };
        let num_nodes = distance_matrix.num_locations();

        if self.num_vehicles == 0 {
            return Err(ModelError::InvalidModel(
                "at least one vehicle is required".to_string(),
            ));
        }

        if self.depot >= num_nodes {
            return Err(ModelError::InvalidModel(format!(
                "depot {} is out of range for {num_nodes} nodes",
                self.depot
            )));
        }

        let depot = NodeIdx::new(self.depot);
        let (capacities, demands) = validate_capacities(
            self.vehicle_capacities,
            self.demands,
            self.num_vehicles,
            num_nodes,
            depot,
        )?;

        let pickups_deliveries = validate_pickups_deliveries(
            self.pickups_deliveries.unwrap_or_default(),
            num_nodes,
            depot,
        )?;

        let mut pair_of_node = vec![None; num_nodes];
        for (index, pair) in pickups_deliveries.iter().enumerate() {
            pair_of_node[pair.pickup()] = Some(index);
            pair_of_node[pair.delivery()] = Some(index);
        }

        let vehicles = (0..self.num_vehicles)
            .map(|vehicle| {
                Vehicle::new(
                    depot,
                    capacities.as_ref().map(|capacities| capacities[vehicle]),
                )
            })
            .collect();

        Ok(RoutingDataModel {
            distance_matrix,
            vehicles,
            depot,
            demands,
            pickups_deliveries,
            pair_of_node,
        })
    }
}

type CapacityConfig = (Option<Vec<i64>>, Option<Vec<i64>>);

fn validate_capacities(
    capacities: Option<Vec<i64>>,
    demands: Option<Vec<i64>>,
    num_vehicles: usize,
    num_nodes: usize,
    depot: NodeIdx,
) -> ModelResult<CapacityConfig> {
    match (capacities, demands) {
        (None, None) => Ok((None, None)),
        (Some(_), None) => Err(ModelError::InconsistentCapacityConfig(
            "vehicle capacities were given without demands".to_string(),
        )),
        (None, Some(_)) => Err(ModelError::InconsistentCapacityConfig(
            "demands were given without vehicle capacities".to_string(),
        )),
        (Some(capacities), Some(demands)) => {
            if capacities.len() != num_vehicles {
                return Err(ModelError::InconsistentCapacityConfig(format!(
                    "expected {num_vehicles} vehicle capacities, got {}",
                    capacities.len()
                )));
            }

            if demands.len() != num_nodes {
                return Err(ModelError::InconsistentCapacityConfig(format!(
                    "expected {num_nodes} demands, got {}",
                    demands.len()
                )));
            }

            if let Some(vehicle) = capacities.iter().position(|&capacity| capacity < 0) {
                return Err(ModelError::InconsistentCapacityConfig(format!(
                    "vehicle {vehicle} has a negative capacity"
                )));
            }

            if let Some(node) = demands.iter().position(|&demand| demand < 0) {
                return Err(ModelError::InconsistentCapacityConfig(format!(
                    "node {node} has a negative demand"
                )));
            }

            if demands[depot] != 0 {
                return Err(ModelError::InconsistentCapacityConfig(format!(
                    "depot {depot} must have a zero demand, got {}",
                    demands[depot]
                )));
            }

            Ok((Some(capacities), Some(demands)))
        }
    }
}

fn validate_pickups_deliveries(
    pairs: Vec<(usize, usize)>,
    num_nodes: usize,
    depot: NodeIdx,
) -> ModelResult<Vec<PickupDeliveryPair>> {
    let mut seen = vec![false; num_nodes];

    pairs
        .into_iter()
        .map(|(pickup, delivery)| {
            for node in [pickup, delivery] {
                if node >= num_nodes {
                    return Err(ModelError::InvalidPickupDelivery(format!(
                        "node {node} is out of range for {num_nodes} nodes"
                    )));
                }

                if node == depot.get() {
                    return Err(ModelError::InvalidPickupDelivery(format!(
                        "the depot {node} cannot be a pickup or a delivery"
                    )));
                }
            }

            if pickup == delivery {
                return Err(ModelError::InvalidPickupDelivery(format!(
                    "node {pickup} cannot be both the pickup and the delivery of a pair"
                )));
            }

            for node in [pickup, delivery] {
                if seen[node] {
                    return Err(ModelError::InvalidPickupDelivery(format!(
                        "node {node} appears in more than one pair"
                    )));
                }
                seen[node] = true;
            }

            Ok(PickupDeliveryPair::from((pickup, delivery)))
        })
        .collect()
}
