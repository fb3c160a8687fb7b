use std::sync::Arc;

use crate::{
    define_index_newtype,
    model::transit::{TransitCallbackId, TransitMatrix},
    problem::{node::NodeIdx, vehicle::VehicleIdx},
};

define_index_newtype!(DimensionIdx, Dimension, i64, Vec<i64>);

/// A named quantity accumulated along every route, bounded by a per-vehicle capacity.
///
/// Cumuls are propagated as `cumul(start) = 0` and `cumul(j) = cumul(i) + transit(i, j)`.
/// Transits are non-negative, so cumuls only grow along a route and the smallest
/// feasible value is always the one used: slack is never consumed.
#[derive(Debug, Clone)]
pub struct Dimension {
    name: String,
    callback: TransitCallbackId,
    transits: Arc<TransitMatrix>,
    slack_max: i64,
    vehicle_capacities: Vec<i64>,
    start_at_zero: bool,
    global_span_cost_coefficient: i64,
}

impl Dimension {
    pub(crate) fn new(
        name: String,
        callback: TransitCallbackId,
        transits: Arc<TransitMatrix>,
        slack_max: i64,
        vehicle_capacities: Vec<i64>,
        start_at_zero: bool,
    ) -> Self {
        Dimension {
            name,
            callback,
            transits,
            slack_max,
            vehicle_capacities,
            start_at_zero,
            global_span_cost_coefficient: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callback(&self) -> TransitCallbackId {
        self.callback
    }

    #[inline(always)]
    pub fn transit(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.transits.get(from, to)
    }

    pub fn transits(&self) -> &TransitMatrix {
        &self.transits
    }

    pub fn slack_max(&self) -> i64 {
        self.slack_max
    }

    #[inline(always)]
    pub fn capacity(&self, vehicle: VehicleIdx) -> i64 {
        self.vehicle_capacities[vehicle.get()]
    }

    pub fn vehicle_capacities(&self) -> &[i64] {
        &self.vehicle_capacities
    }

    pub fn start_at_zero(&self) -> bool {
        self.start_at_zero
    }

    pub fn global_span_cost_coefficient(&self) -> i64 {
        self.global_span_cost_coefficient
    }

    pub(crate) fn set_global_span_cost_coefficient(&mut self, coefficient: i64) {
        self.global_span_cost_coefficient = coefficient;
    }

    /// Span cost of a set of route end cumuls, one per vehicle.
    pub fn span_cost(&self, end_cumuls: impl IntoIterator<Item = i64>) -> i64 {
        if self.global_span_cost_coefficient == 0 {
            return 0;
        }

        let (min, max) = end_cumuls
            .into_iter()
            .fold((i64::MAX, i64::MIN), |(min, max), cumul| {
                (min.min(cumul), max.max(cumul))
            });

        if min > max {
            return 0;
        }

        self.global_span_cost_coefficient * (max - min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_cost() {
        let transits = TransitMatrix::compute(&|_: NodeIdx, _: NodeIdx| 1_i64, 2).unwrap();
        let mut dimension = Dimension::new(
            "Distance".to_string(),
            TransitCallbackId::new(0),
            Arc::new(transits),
            0,
            vec![10, 10, 10],
            true,
        );

        assert_eq!(dimension.span_cost([4, 0, 9]), 0);

        dimension.set_global_span_cost_coefficient(100);
        assert_eq!(dimension.span_cost([4, 0, 9]), 900);
        assert_eq!(dimension.span_cost([3]), 0);
        assert_eq!(dimension.span_cost([]), 0);
    }
}
