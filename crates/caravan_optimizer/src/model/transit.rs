use std::sync::Arc;

use crate::{
    define_index_newtype,
    error::{ModelError, ModelResult},
    problem::{data_model::RoutingDataModel, node::NodeIdx},
};

define_index_newtype!(TransitCallbackId);

/// Quantity accumulated when travelling from one node to another.
///
/// Implementations must be pure and total over the nodes of the model: values are read
/// once into a [`TransitMatrix`] when a dimension or arc cost evaluator uses them.
pub trait TransitFunction: Send + Sync {
    fn transit(&self, from: NodeIdx, to: NodeIdx) -> i64;
}

impl<F> TransitFunction for F
where
    F: Fn(NodeIdx, NodeIdx) -> i64 + Send + Sync,
{
    fn transit(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self(from, to)
    }
}

/// Integer travel cost from the distance matrix.
pub struct DistanceTransit {
    data: Arc<RoutingDataModel>,
}

impl DistanceTransit {
    pub fn new(data: Arc<RoutingDataModel>) -> Self {
        DistanceTransit { data }
    }
}

impl TransitFunction for DistanceTransit {
    fn transit(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.data.cost(from, to)
    }
}

/// Unary transit: arriving at a node adds its demand.
pub struct DemandTransit {
    demands: Vec<i64>,
}

impl DemandTransit {
    pub fn new(demands: Vec<i64>) -> Self {
        DemandTransit { demands }
    }
}

impl TransitFunction for DemandTransit {
    fn transit(&self, _from: NodeIdx, to: NodeIdx) -> i64 {
        self.demands[to.get()]
    }
}

/// Transit values of every ordered node pair, stored flat.
#[derive(Debug)]
pub struct TransitMatrix {
    values: Vec<i64>,
    num_nodes: usize,
    max_value: i64,
}

impl TransitMatrix {
    pub fn compute(function: &dyn TransitFunction, num_nodes: usize) -> ModelResult<Self> {
        let mut values = Vec::with_capacity(num_nodes * num_nodes);
        let mut max_value = 0;

        for from in (0..num_nodes).map(NodeIdx::new) {
            for to in (0..num_nodes).map(NodeIdx::new) {
                let value = function.transit(from, to);
                if value < 0 {
                    return Err(ModelError::InvalidModel(format!(
                        "transit from {from} to {to} is negative ({value})"
                    )));
                }

                max_value = max_value.max(value);
                values.push(value);
            }
        }

        Ok(TransitMatrix {
            values,
            num_nodes,
            max_value,
        })
    }

    #[inline(always)]
    pub fn get(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.values[from.get() * self.num_nodes + to.get()]
    }

    /// Largest single-arc transit.
    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Smallest transit of an arc entering `to` from another node.
    pub fn min_incoming(&self, to: NodeIdx) -> i64 {
        (0..self.num_nodes)
            .filter(|&from| from != to.get())
            .map(|from| self.values[from * self.num_nodes + to.get()])
            .min()
            .unwrap_or(0)
    }

    /// Smallest transit of an arc leaving `from` towards another node.
    pub fn min_outgoing(&self, from: NodeIdx) -> i64 {
        (0..self.num_nodes)
            .filter(|&to| to != from.get())
            .map(|to| self.values[from.get() * self.num_nodes + to])
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_closure_transit() {
        let matrix = TransitMatrix::compute(
            &|from: NodeIdx, to: NodeIdx| (from.get() * 10 + to.get()) as i64,
            3,
        )
        .unwrap();

        assert_eq!(matrix.get(NodeIdx::new(2), NodeIdx::new(1)), 21);
        assert_eq!(matrix.max_value(), 22);
        assert_eq!(matrix.min_incoming(NodeIdx::new(0)), 10);
        assert_eq!(matrix.min_outgoing(NodeIdx::new(0)), 1);
    }

    #[test]
    fn test_demand_transit() {
        let transit = DemandTransit::new(vec![0, 4, 7]);
        let matrix = TransitMatrix::compute(&transit, 3).unwrap();

        assert_eq!(matrix.get(NodeIdx::new(1), NodeIdx::new(2)), 7);
        assert_eq!(matrix.get(NodeIdx::new(2), NodeIdx::new(0)), 0);
        assert_eq!(matrix.max_value(), 7);
    }

    #[test]
    fn test_negative_transit_is_rejected() {
        let result = TransitMatrix::compute(&|_: NodeIdx, _: NodeIdx| -1_i64, 2);
        assert!(matches!(result, Err(ModelError::InvalidModel(_))));
    }
}
