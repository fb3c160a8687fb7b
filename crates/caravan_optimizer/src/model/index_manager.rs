use crate::{
    define_index_newtype,
    problem::{node::NodeIdx, vehicle::VehicleIdx},
};

define_index_newtype!(RoutingIndex, Option<RoutingIndex>, Option<VehicleIdx>, i64);

/// Maps stops to the internal indices used by assignments.
///
/// ```text
/// [0, N-1)           stops other than the depot, in ascending node order
/// [N-1, N-1+V)       start of each vehicle (a copy of the depot)
/// [N-1+V, N-1+2V)    end of each vehicle (a copy of the depot)
/// ```
#[derive(Debug, Clone)]
pub struct RoutingIndexManager {
    num_nodes: usize,
    num_vehicles: usize,
    depot: NodeIdx,
    index_to_node: Vec<NodeIdx>,
    node_to_index: Vec<Option<RoutingIndex>>,
}

impl RoutingIndexManager {
    pub fn new(num_nodes: usize, num_vehicles: usize, depot: NodeIdx) -> Self {
        assert!(depot.get() < num_nodes, "depot {depot} out of range");

        let num_stops = num_nodes - 1;
        let mut index_to_node = Vec::with_capacity(num_stops + 2 * num_vehicles);
        let mut node_to_index = vec![None; num_nodes];

        for node in (0..num_nodes).map(NodeIdx::new) {
            if node == depot {
                continue;
            }

            node_to_index[node.get()] = Some(RoutingIndex::new(index_to_node.len()));
            index_to_node.push(node);
        }

        // Starts then ends, all mapped to the depot.
        index_to_node.extend(std::iter::repeat_n(depot, 2 * num_vehicles));

        RoutingIndexManager {
            num_nodes,
            num_vehicles,
            depot,
            index_to_node,
            node_to_index,
        }
    }

    pub fn size(&self) -> usize {
        self.index_to_node.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn depot(&self) -> NodeIdx {
        self.depot
    }

    #[inline]
    pub fn index_to_node(&self, index: RoutingIndex) -> NodeIdx {
        self.index_to_node[index.get()]
    }

    /// Index of a node. The depot resolves to the start index of `vehicle`.
    pub fn node_to_index(&self, node: NodeIdx, vehicle: VehicleIdx) -> RoutingIndex {
        if node == self.depot {
            self.start_index(vehicle)
        } else {
            self.node_to_index[node.get()]
                .unwrap_or_else(|| panic!("node {node} is not part of the model"))
        }
    }

    pub fn start_index(&self, vehicle: VehicleIdx) -> RoutingIndex {
        RoutingIndex::new(self.num_nodes - 1 + vehicle.get())
    }

    pub fn end_index(&self, vehicle: VehicleIdx) -> RoutingIndex {
        RoutingIndex::new(self.num_nodes - 1 + self.num_vehicles + vehicle.get())
    }

    pub fn is_start(&self, index: RoutingIndex) -> bool {
        let first = self.num_nodes - 1;
        (first..first + self.num_vehicles).contains(&index.get())
    }

    pub fn is_end(&self, index: RoutingIndex) -> bool {
        let first = self.num_nodes - 1 + self.num_vehicles;
        (first..first + self.num_vehicles).contains(&index.get())
    }

    /// Vehicle owning a start or end index, `None` for stop indices.
    pub fn vehicle_of_depot_index(&self, index: RoutingIndex) -> Option<VehicleIdx> {
        let first = self.num_nodes - 1;
        if self.is_start(index) {
            Some(VehicleIdx::new(index.get() - first))
        } else if self.is_end(index) {
            Some(VehicleIdx::new(index.get() - first - self.num_vehicles))
        } else {
            None
        }
    }
}
