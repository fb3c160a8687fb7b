use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    model::{
        dimension::DimensionIdx,
        routing_model::{NodeRole, RoutingModel},
    },
    problem::{node::NodeIdx, vehicle::VehicleIdx},
    solver::solution::arc_penalties::ArcPenalties,
};

static ROUTE_VERSION: AtomicUsize = AtomicUsize::new(0);

fn next_version() -> usize {
    ROUTE_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Route of one vehicle with prefix sums over its extended sequence `[depot, nodes..., depot]`.
///
/// For every metric of the model (arc cost, then each dimension transit) `forward[m][k]`
/// holds the value accumulated from the start up to extended position `k`, which is the
/// cumul of the dimension at that position. `backward[m][k]` accumulates the same arcs
/// travelled in the opposite direction, so the cost of a reversed sub-sequence is read in
/// constant time.
#[derive(Clone, Debug)]
pub struct WorkingSolutionRoute {
    vehicle_id: VehicleIdx,
    depot: NodeIdx,
    nodes: Vec<NodeIdx>,
    forward: Vec<Vec<i64>>,
    backward: Vec<Vec<i64>>,
    penalty_forward: Vec<i64>,
    penalty_backward: Vec<i64>,
    /// Pickups visited up to a position whose delivery comes later.
    open_pairs: Vec<i32>,
    version: usize,
}

impl WorkingSolutionRoute {
    pub fn empty(model: &RoutingModel, vehicle_id: VehicleIdx) -> Self {
        let mut route = WorkingSolutionRoute {
            vehicle_id,
            depot: model.depot(),
            nodes: Vec::new(),
            forward: vec![Vec::new(); model.num_metrics()],
            backward: vec![Vec::new(); model.num_metrics()],
            penalty_forward: Vec::new(),
            penalty_backward: Vec::new(),
            open_pairs: Vec::new(),
            version: 0,
        };

        route.resync(model, None);
        route
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    /// Changes every time the content of the route changes.
    pub fn version(&self) -> usize {
        self.version
    }

    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, position: usize) -> NodeIdx {
        self.nodes[position]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at a position of the extended sequence, the depot at both ends.
    #[inline]
    pub fn ext_node(&self, position: usize) -> NodeIdx {
        if position == 0 || position > self.nodes.len() {
            self.depot
        } else {
            self.nodes[position - 1]
        }
    }

    /// Last position of the extended sequence, the end depot.
    pub fn end_position(&self) -> usize {
        self.nodes.len() + 1
    }

    /// Metric accumulated over the arcs between two extended positions.
    #[inline]
    pub fn interior(&self, metric: usize, start: usize, end: usize, reversed: bool) -> i64 {
        if reversed {
            self.backward[metric][end] - self.backward[metric][start]
        } else {
            self.forward[metric][end] - self.forward[metric][start]
        }
    }

    #[inline]
    pub fn penalty_interior(&self, start: usize, end: usize, reversed: bool) -> i64 {
        if reversed {
            self.penalty_backward[end] - self.penalty_backward[start]
        } else {
            self.penalty_forward[end] - self.penalty_forward[start]
        }
    }

    /// Total of a metric over the route. Unused vehicles account for nothing.
    pub fn total(&self, metric: usize) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.forward[metric][self.end_position()]
        }
    }

    pub fn cost(&self) -> i64 {
        self.total(0)
    }

    pub fn penalty(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.penalty_forward[self.end_position()]
        }
    }

    pub fn end_cumul(&self, dimension: DimensionIdx) -> i64 {
        self.total(dimension.get() + 1)
    }

    /// Cumul of a dimension at an extended position.
    pub fn cumul(&self, dimension: DimensionIdx, position: usize) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.forward[dimension.get() + 1][position]
        }
    }

    #[inline]
    pub fn open_pairs(&self, position: usize) -> i32 {
        self.open_pairs[position]
    }

    pub(crate) fn set_nodes(
        &mut self,
        model: &RoutingModel,
        nodes: Vec<NodeIdx>,
        penalties: Option<&ArcPenalties>,
    ) {
        self.nodes = nodes;
        self.resync(model, penalties);
    }

    /// Recomputes every prefix sum and bumps the version.
    pub(crate) fn resync(&mut self, model: &RoutingModel, penalties: Option<&ArcPenalties>) {
        let sequence = (0..self.nodes.len() + 2)
            .map(|position| self.ext_node(position))
            .collect::<Vec<_>>();

        for metric in 0..model.num_metrics() {
            let forward = &mut self.forward[metric];
            let backward = &mut self.backward[metric];
            forward.clear();
            backward.clear();
            forward.push(0);
            backward.push(0);

            for (position, arc) in sequence.windows(2).enumerate() {
                forward.push(forward[position] + model.metric(metric, arc[0], arc[1]));
                backward.push(backward[position] + model.metric(metric, arc[1], arc[0]));
            }
        }

        self.penalty_forward.clear();
        self.penalty_backward.clear();
        self.penalty_forward.push(0);
        self.penalty_backward.push(0);
        for (position, arc) in sequence.windows(2).enumerate() {
            let (forward, backward) = penalties.map_or((0, 0), |penalties| {
                (penalties.get(arc[0], arc[1]), penalties.get(arc[1], arc[0]))
            });

            self.penalty_forward
                .push(self.penalty_forward[position] + forward);
            self.penalty_backward
                .push(self.penalty_backward[position] + backward);
        }

        self.open_pairs.clear();
        self.open_pairs.push(0);
        for (position, &node) in sequence.iter().enumerate().skip(1) {
            let change = match model.node_role(node) {
                NodeRole::Pickup { .. } => 1,
                NodeRole::Delivery { .. } => -1,
                NodeRole::Regular => 0,
            };
            self.open_pairs.push(self.open_pairs[position - 1] + change);
        }

        self.version = next_version();
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::dimension::DimensionIdx,
        solver::solution::route_id::RouteIdx,
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_prefix_sums() {
        let model = test_utils::create_line_model(
            6,
            1,
            TestModelOptions {
                distance_capacity: Some(1000),
                ..TestModelOptions::default()
            },
        );
        let solution = test_utils::create_test_working_solution(&model, vec![vec![2, 4, 1]]);
        let route = solution.route(RouteIdx::new(0));

        // 0 -> 2 -> 4 -> 1 -> 0
        assert_eq!(route.cost(), 2 + 2 + 3 + 1);
        assert_eq!(route.end_cumul(DimensionIdx::new(0)), 8);
        assert_eq!(route.cumul(DimensionIdx::new(0), 2), 4);
        assert_eq!(route.interior(0, 1, 3, false), 5);
        assert_eq!(route.interior(0, 1, 3, true), 5);
        assert_eq!(route.ext_node(0), route.ext_node(route.end_position()));
    }

    #[test]
    fn test_empty_route_accounts_nothing() {
        let model = test_utils::create_line_model(4, 2, TestModelOptions::default());
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3], vec![]]);

        let route = solution.route(RouteIdx::new(1));
        assert!(route.is_empty());
        assert_eq!(route.cost(), 0);
        assert_eq!(route.end_position(), 1);
    }

    #[test]
    fn test_open_pairs() {
        let model = test_utils::create_line_model(
            6,
            1,
            TestModelOptions {
                distance_capacity: Some(1000),
                pickups_deliveries: vec![(1, 3), (2, 5)],
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3, 4, 5]]);
        let route = solution.route(RouteIdx::new(0));

        assert_eq!(
            (0..=route.end_position())
                .map(|position| route.open_pairs(position))
                .collect::<Vec<_>>(),
            vec![0, 1, 2, 1, 1, 0, 0]
        );
    }
}
