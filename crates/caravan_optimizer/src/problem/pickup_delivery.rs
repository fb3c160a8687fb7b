use serde::Serialize;

use crate::problem::node::NodeIdx;

/// A pickup that must be visited before its delivery, by the same vehicle.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickupDeliveryPair {
    pickup: NodeIdx,
    delivery: NodeIdx,
}

impl PickupDeliveryPair {
    pub fn new(pickup: NodeIdx, delivery: NodeIdx) -> Self {
        PickupDeliveryPair { pickup, delivery }
    }

    pub fn pickup(&self) -> NodeIdx {
        self.pickup
    }

    pub fn delivery(&self) -> NodeIdx {
        self.delivery
    }
}

impl From<(usize, usize)> for PickupDeliveryPair {
    fn from((pickup, delivery): (usize, usize)) -> Self {
        PickupDeliveryPair::new(NodeIdx::new(pickup), NodeIdx::new(delivery))
    }
}
