use std::sync::Arc;

use fxhash::FxHashSet;
use smallvec::{SmallVec, smallvec};

use crate::{
    model::{dimension::DimensionIdx, routing_model::RoutingModel},
    problem::node::NodeIdx,
    solver::{
        insertion::Insertion,
        solution::{
            arc_penalties::ArcPenalties,
            route::WorkingSolutionRoute,
            route_change::{MoveEvaluation, RouteChange, Segment},
            route_id::RouteIdx,
        },
    },
};

type MetricTotals = SmallVec<[i64; 4]>;

/// Mutable solution the search works on: one route per vehicle plus the unassigned stops.
#[derive(Clone)]
pub struct WorkingSolution {
    model: Arc<RoutingModel>,
    routes: Vec<WorkingSolutionRoute>,
    unassigned_nodes: FxHashSet<NodeIdx>,
    node_positions: Vec<Option<(RouteIdx, usize)>>,
    penalties: Option<Arc<ArcPenalties>>,
}

impl WorkingSolution {
    pub fn new(model: Arc<RoutingModel>) -> Self {
        let routes = model
            .vehicles()
            .map(|vehicle_id| WorkingSolutionRoute::empty(&model, vehicle_id))
            .collect();
        let unassigned_nodes = model.data().stops().collect();
        let node_positions = vec![None; model.num_nodes()];

        WorkingSolution {
            model,
            routes,
            unassigned_nodes,
            node_positions,
            penalties: None,
        }
    }

    /// Solution with the given node sequences, one per vehicle in order.
    pub fn with_routes(model: Arc<RoutingModel>, routes: Vec<Vec<NodeIdx>>) -> Self {
        let mut solution = WorkingSolution::new(model);

        for (index, nodes) in routes.into_iter().enumerate() {
            let route_id = RouteIdx::new(index);
            let mut change = RouteChange::new(route_id).range(route_id, 0, 0);
            for node in nodes {
                change = change.node(node);
            }
            change = change.range(route_id, 1, 1);

            solution.apply_changes(&[change]);
        }

        solution
    }

    pub fn model(&self) -> &RoutingModel {
        &self.model
    }

    pub fn model_arc(&self) -> &Arc<RoutingModel> {
        &self.model
    }

    pub fn routes(&self) -> &[WorkingSolutionRoute] {
        &self.routes
    }

    #[inline]
    pub fn route(&self, route_id: RouteIdx) -> &WorkingSolutionRoute {
        &self.routes[route_id]
    }

    pub fn route_ids(&self) -> impl Iterator<Item = RouteIdx> + use<> {
        (0..self.routes.len()).map(RouteIdx::new)
    }

    pub fn non_empty_routes_iter(&self) -> impl Iterator<Item = &WorkingSolutionRoute> {
        self.routes.iter().filter(|route| !route.is_empty())
    }

    pub fn unassigned_nodes(&self) -> &FxHashSet<NodeIdx> {
        &self.unassigned_nodes
    }

    /// Unassigned nodes in ascending order.
    pub fn sorted_unassigned_nodes(&self) -> Vec<NodeIdx> {
        let mut nodes = self.unassigned_nodes.iter().copied().collect::<Vec<_>>();
        nodes.sort_unstable();
        nodes
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned_nodes.is_empty()
    }

    /// Route and position of an assigned node.
    #[inline]
    pub fn position_of(&self, node: NodeIdx) -> Option<(RouteIdx, usize)> {
        self.node_positions[node.get()]
    }

    pub fn transport_cost(&self) -> i64 {
        self.routes.iter().map(|route| route.cost()).sum()
    }

    pub fn span_cost_of(&self, dimension: DimensionIdx) -> i64 {
        self.model
            .dimension(dimension)
            .span_cost(self.routes.iter().map(|route| route.end_cumul(dimension)))
    }

    pub fn span_cost(&self) -> i64 {
        (0..self.model.dimensions().len())
            .map(|dimension| self.span_cost_of(DimensionIdx::new(dimension)))
            .sum()
    }

    /// Arc costs plus global span costs.
    pub fn objective(&self) -> i64 {
        self.transport_cost() + self.span_cost()
    }

    pub fn penalty(&self) -> i64 {
        self.routes.iter().map(|route| route.penalty()).sum()
    }

    pub fn penalties(&self) -> Option<&ArcPenalties> {
        self.penalties.as_deref()
    }

    /// Replaces the arc penalties and refreshes every route.
    pub fn set_penalties(&mut self, penalties: Option<Arc<ArcPenalties>>) {
        self.penalties = penalties;
        for route in self.routes.iter_mut() {
            route.resync(&self.model, self.penalties.as_deref());
        }
    }

    /// Evaluates new contents for some routes without applying them.
    ///
    /// Returns `None` when a changed route exceeds the capacity of a dimension. Cumuls
    /// never decrease along a route, so bounding the end cumul bounds every position.
    pub fn evaluate(&self, changes: &[RouteChange]) -> Option<MoveEvaluation> {
        let mut evaluation = MoveEvaluation::default();
        let mut new_totals: SmallVec<[(RouteIdx, MetricTotals); 2]> = SmallVec::new();

        for change in changes {
            let (totals, penalty) = self.evaluate_sequence(&change.segments);
            let route = self.route(change.route);
            let vehicle_id = route.vehicle_id();

            for (index, dimension) in self.model.dimensions().iter().enumerate() {
                if totals[index + 1] > dimension.capacity(vehicle_id) {
                    return None;
                }
            }

            evaluation.arc_cost_delta += totals[0] - route.cost();
            evaluation.penalty_delta += penalty - route.penalty();
            new_totals.push((change.route, totals));
        }

        evaluation.cost_delta = evaluation.arc_cost_delta;
        for (index, dimension) in self.model.dimensions().iter().enumerate() {
            if dimension.global_span_cost_coefficient() == 0 {
                continue;
            }

            let dimension_id = DimensionIdx::new(index);
            let end_cumuls = self.routes.iter().enumerate().map(|(route_index, route)| {
                new_totals
                    .iter()
                    .find(|(route_id, _)| route_id.get() == route_index)
                    .map_or_else(
                        || route.end_cumul(dimension_id),
                        |(_, totals)| totals[index + 1],
                    )
            });

            evaluation.cost_delta +=
                dimension.span_cost(end_cumuls) - self.span_cost_of(dimension_id);
        }

        Some(evaluation)
    }

    fn evaluate_sequence(&self, segments: &[Segment]) -> (MetricTotals, i64) {
        let num_metrics = self.model.num_metrics();
        let mut totals: MetricTotals = smallvec![0; num_metrics];
        let mut penalty = 0;
        let mut previous: Option<NodeIdx> = None;
        let mut length = 0;

        for segment in segments {
            let (first, last) = match *segment {
                Segment::Range {
                    route,
                    start,
                    end,
                    reversed,
                } => {
                    let route = &self.routes[route];
                    for (metric, total) in totals.iter_mut().enumerate() {
                        *total += route.interior(metric, start, end, reversed);
                    }
                    penalty += route.penalty_interior(start, end, reversed);
                    length += end - start + 1;

                    if reversed {
                        (route.ext_node(end), route.ext_node(start))
                    } else {
                        (route.ext_node(start), route.ext_node(end))
                    }
                }
                Segment::Node(node) => {
                    length += 1;
                    (node, node)
                }
            };

            if let Some(previous) = previous {
                for (metric, total) in totals.iter_mut().enumerate() {
                    *total += self.model.metric(metric, previous, first);
                }
                if let Some(penalties) = &self.penalties {
                    penalty += penalties.get(previous, first);
                }
            }

            previous = Some(last);
        }

        // Only the two depots: the vehicle is unused.
        if length <= 2 {
            return (smallvec![0; num_metrics], 0);
        }

        (totals, penalty)
    }

    fn materialize(&self, segments: &[Segment]) -> Vec<NodeIdx> {
        let mut nodes = Vec::new();

        for segment in segments {
            match *segment {
                Segment::Range {
                    route,
                    start,
                    end,
                    reversed,
                } => {
                    let route = &self.routes[route];
                    let end_position = route.end_position();
                    let positions = (start..=end)
                        .filter(|&position| position != 0 && position != end_position);

                    if reversed {
                        nodes.extend(positions.rev().map(|position| route.ext_node(position)));
                    } else {
                        nodes.extend(positions.map(|position| route.ext_node(position)));
                    }
                }
                Segment::Node(node) => nodes.push(node),
            }
        }

        nodes
    }

    pub fn apply_changes(&mut self, changes: &[RouteChange]) {
        let materialized = changes
            .iter()
            .map(|change| (change.route, self.materialize(&change.segments)))
            .collect::<SmallVec<[_; 2]>>();

        let mut previous_nodes: SmallVec<[NodeIdx; 16]> = SmallVec::new();
        for &(route_id, _) in &materialized {
            for &node in self.routes[route_id].nodes() {
                self.node_positions[node.get()] = None;
                previous_nodes.push(node);
            }
        }

        for (route_id, nodes) in materialized {
            for (position, &node) in nodes.iter().enumerate() {
                self.node_positions[node.get()] = Some((route_id, position));
                self.unassigned_nodes.remove(&node);
            }

            self.routes[route_id].set_nodes(&self.model, nodes, self.penalties.as_deref());
        }

        for node in previous_nodes {
            if self.node_positions[node.get()].is_none() {
                self.unassigned_nodes.insert(node);
            }
        }
    }

    pub fn insert(&mut self, insertion: &Insertion) {
        let change = insertion.route_change(self);
        self.apply_changes(&[change]);
    }

    /// Removes a node from its route, leaving it unassigned.
    pub fn remove(&mut self, node: NodeIdx) {
        if let Some((route_id, position)) = self.position_of(node) {
            let end = self.route(route_id).end_position();
            let change = RouteChange::new(route_id)
                .range(route_id, 0, position)
                .range(route_id, position + 2, end);
            self.apply_changes(&[change]);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::node::NodeIdx,
        solver::solution::{route_change::RouteChange, route_id::RouteIdx},
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_evaluate_matches_apply() {
        let model = test_utils::create_line_model(
            8,
            2,
            TestModelOptions {
                distance_capacity: Some(1000),
                span_coefficient: 10,
                ..TestModelOptions::default()
            },
        );
        let mut solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3], vec![7, 6, 5, 4]]);

        let before = solution.objective();
        let r0 = RouteIdx::new(0);
        let r1 = RouteIdx::new(1);

        // Move node 4 (last of route 1) to the end of route 0.
        let changes = [
            RouteChange::new(r0)
                .range(r0, 0, 3)
                .node(NodeIdx::new(4))
                .range(r0, 4, 4),
            RouteChange::new(r1).range(r1, 0, 3).range(r1, 5, 5),
        ];

        let evaluation = solution.evaluate(&changes).unwrap();
        solution.apply_changes(&changes);

        assert_eq!(solution.objective(), before + evaluation.cost_delta);
        assert_eq!(
            test_utils::route_nodes(&solution, 0),
            vec![1, 2, 3, 4]
        );
        assert_eq!(test_utils::route_nodes(&solution, 1), vec![7, 6, 5]);
        assert_eq!(solution.position_of(NodeIdx::new(4)), Some((r0, 3)));
    }

    #[test]
    fn test_evaluate_reversed_segment() {
        let model = test_utils::create_line_model(6, 1, TestModelOptions::default());
        let mut solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 4, 3, 2, 5]]);

        let before = solution.objective();
        let r0 = RouteIdx::new(0);
        let changes = [RouteChange::new(r0)
            .range(r0, 0, 1)
            .reversed(r0, 2, 4)
            .range(r0, 5, 6)];

        let evaluation = solution.evaluate(&changes).unwrap();
        solution.apply_changes(&changes);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2, 3, 4, 5]);
        assert_eq!(solution.objective(), 10);
        assert_eq!(before + evaluation.cost_delta, 10);
    }

    #[test]
    fn test_evaluate_rejects_capacity_violation() {
        let model = test_utils::create_line_model(
            5,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![2, 2]),
                demands: Some(vec![0, 1, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2], vec![3, 4]]);

        let r0 = RouteIdx::new(0);
        let changes = [RouteChange::new(r0)
            .range(r0, 0, 2)
            .node(NodeIdx::new(3))
            .range(r0, 3, 3)];

        assert!(solution.evaluate(&changes).is_none());
    }

    #[test]
    fn test_remove_and_unassigned() {
        let model = test_utils::create_line_model(5, 1, TestModelOptions::default());
        let mut solution = test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3, 4]]);
        assert!(solution.is_complete());

        solution.remove(NodeIdx::new(2));

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 3, 4]);
        assert_eq!(solution.sorted_unassigned_nodes(), vec![NodeIdx::new(2)]);
        assert_eq!(solution.position_of(NodeIdx::new(3)), Some((RouteIdx::new(0), 1)));
    }
}
