use serde::Serialize;

use crate::{define_index_newtype, problem::node::NodeIdx};

define_index_newtype!(VehicleIdx, Vehicle, i64);

/// A vehicle of the fleet. Every vehicle starts and ends at the depot.
#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    start: NodeIdx,
    end: NodeIdx,
    capacity: Option<i64>,
}

impl Vehicle {
    pub fn new(depot: NodeIdx, capacity: Option<i64>) -> Self {
        Vehicle {
            start: depot,
            end: depot,
            capacity,
        }
    }

    pub fn start(&self) -> NodeIdx {
        self.start
    }

    pub fn end(&self) -> NodeIdx {
        self.end
    }

    pub fn capacity(&self) -> Option<i64> {
        self.capacity
    }
}
