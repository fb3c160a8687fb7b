use serde::Serialize;

use crate::{
    model::{
        dimension::DimensionIdx,
        index_manager::{RoutingIndex, RoutingIndexManager},
    },
    problem::vehicle::VehicleIdx,
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
};

/// Decoded solution over the internal indices of a [`RoutingIndexManager`].
///
/// Every index has a successor except the end indices. Unused vehicles go straight from
/// their start to their end.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    successors: Vec<Option<RoutingIndex>>,
    vehicles: Vec<Option<VehicleIdx>>,
    /// `cumuls[dimension][index]`
    cumuls: Vec<Vec<i64>>,
}

impl Assignment {
    pub fn from_solution(solution: &WorkingSolution) -> Self {
        let model = solution.model();
        let manager = model.index_manager();
        let size = manager.size();

        let mut successors = vec![None; size];
        let mut vehicles = vec![None; size];
        let mut cumuls = vec![vec![0; size]; model.dimensions().len()];

        for vehicle_id in model.vehicles() {
            let route = solution.route(RouteIdx::from(vehicle_id));
            let end_position = route.end_position();

            let indices = (0..=end_position)
                .map(|position| match position {
                    0 => manager.start_index(vehicle_id),
                    position if position == end_position => manager.end_index(vehicle_id),
                    position => manager.node_to_index(route.ext_node(position), vehicle_id),
                })
                .collect::<Vec<_>>();

            for (position, &index) in indices.iter().enumerate() {
                successors[index.get()] = indices.get(position + 1).copied();
                vehicles[index.get()] = Some(vehicle_id);

                for (dimension, values) in cumuls.iter_mut().enumerate() {
                    values[index.get()] = route.cumul(DimensionIdx::new(dimension), position);
                }
            }
        }

        Assignment {
            successors,
            vehicles,
            cumuls,
        }
    }

    pub fn next(&self, index: RoutingIndex) -> Option<RoutingIndex> {
        self.successors[index]
    }

    pub fn vehicle(&self, index: RoutingIndex) -> Option<VehicleIdx> {
        self.vehicles[index]
    }

    pub fn cumul(&self, dimension: DimensionIdx, index: RoutingIndex) -> i64 {
        self.cumuls[dimension][index]
    }

    /// Indices visited by a vehicle, from its start index to its end index.
    pub fn route(&self, manager: &RoutingIndexManager, vehicle: VehicleIdx) -> Vec<RoutingIndex> {
        let mut indices = vec![manager.start_index(vehicle)];
        let mut current = manager.start_index(vehicle);

        while let Some(next) = self.next(current) {
            indices.push(next);
            current = next;
        }

        indices
    }

    pub fn is_vehicle_used(&self, manager: &RoutingIndexManager, vehicle: VehicleIdx) -> bool {
        self.next(manager.start_index(vehicle)) != Some(manager.end_index(vehicle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::dimension::DimensionIdx,
        problem::node::NodeIdx,
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_assignment_from_solution() {
        let model = test_utils::create_line_model(
            4,
            2,
            TestModelOptions {
                distance_capacity: Some(100),
                ..TestModelOptions::default()
            },
        );
        let solution = test_utils::create_test_working_solution(&model, vec![vec![2, 1, 3]]);
        let assignment = Assignment::from_solution(&solution);
        let manager = model.index_manager();

        let route = assignment
            .route(manager, VehicleIdx::new(0))
            .into_iter()
            .map(|index| manager.index_to_node(index).get())
            .collect::<Vec<_>>();
        assert_eq!(route, vec![0, 2, 1, 3, 0]);

        let end = manager.end_index(VehicleIdx::new(0));
        assert_eq!(assignment.next(end), None);
        assert_eq!(assignment.cumul(DimensionIdx::new(0), end), 2 + 1 + 2 + 3);

        let node_3 = manager.node_to_index(NodeIdx::new(3), VehicleIdx::new(0));
        assert_eq!(assignment.vehicle(node_3), Some(VehicleIdx::new(0)));
        assert_eq!(assignment.cumul(DimensionIdx::new(0), node_3), 5);

        assert!(assignment.is_vehicle_used(manager, VehicleIdx::new(0)));
        assert!(!assignment.is_vehicle_used(manager, VehicleIdx::new(1)));
        assert_eq!(assignment.route(manager, VehicleIdx::new(1)).len(), 2);
    }
}
