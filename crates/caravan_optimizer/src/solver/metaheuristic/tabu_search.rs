use fxhash::FxHashMap;
use tracing::{Level, debug, instrument};

use crate::{
    problem::node::NodeIdx,
    solver::{
        ls::r#move::LocalSearchMove,
        metaheuristic::{greedy_descent::objective_delta, search_context::SearchContext},
        solution::{
            route_change::MoveEvaluation, route_id::RouteIdx, working_solution::WorkingSolution,
        },
    },
};

/// What a tabu list remembers about applied moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabuAttribute {
    /// Recently moved nodes may not move again.
    Node,
    /// Nodes may not go back to a route they recently left.
    NodeRoute,
}

/// Attributes with the iteration until which they stay tabu.
struct TabuList {
    attribute: TabuAttribute,
    tenure: usize,
    nodes: FxHashMap<NodeIdx, usize>,
    node_routes: FxHashMap<(NodeIdx, RouteIdx), usize>,
}

impl TabuList {
    fn new(attribute: TabuAttribute, tenure: usize) -> Self {
        TabuList {
            attribute,
            tenure,
            nodes: FxHashMap::default(),
            node_routes: FxHashMap::default(),
        }
    }

    fn is_tabu(&self, solution: &WorkingSolution, op: &LocalSearchMove, iteration: usize) -> bool {
        op.moved_nodes(solution)
            .iter()
            .any(|&(node, route)| match self.attribute {
                TabuAttribute::Node => self
                    .nodes
                    .get(&node)
                    .is_some_and(|&until| until > iteration),
                TabuAttribute::NodeRoute => self
                    .node_routes
                    .get(&(node, route))
                    .is_some_and(|&until| until > iteration),
            })
    }

    /// Records the move before it is applied.
    fn record(&mut self, solution: &WorkingSolution, op: &LocalSearchMove, iteration: usize) {
        let until = iteration + self.tenure;

        for (node, _) in op.moved_nodes(solution) {
            match self.attribute {
                TabuAttribute::Node => {
                    self.nodes.insert(node, until);
                }
                TabuAttribute::NodeRoute => {
                    if let Some((route, _)) = solution.position_of(node) {
                        self.node_routes.insert((node, route), until);
                    }
                }
            }
        }

        self.nodes.retain(|_, &mut until| until > iteration);
        self.node_routes.retain(|_, &mut until| until > iteration);
    }
}

/// Always moves to the best non-tabu neighbour, even a worse one. A tabu move is allowed
/// when it leads to a new best solution.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn tabu_search(
    solution: &mut WorkingSolution,
    context: &mut SearchContext,
    attribute: TabuAttribute,
) {
    let mut tabu = TabuList::new(attribute, context.params.tabu_tenure);

    while !context.should_terminate() {
        let iteration = context.iteration();
        let current = solution.objective();
        let best_objective = context.best_objective();

        let snapshot: &WorkingSolution = solution;
        let filter = |op: &LocalSearchMove, evaluation: &MoveEvaluation| {
            current + evaluation.cost_delta < best_objective
                || !tabu.is_tabu(snapshot, op, iteration)
        };

        let Some((op, _, _)) = context
            .local_search
            .best_move(snapshot, &objective_delta, &filter)
        else {
            debug!(iteration, "Every move is tabu");
            context.end_iteration(solution);
            continue;
        };

        tabu.record(solution, &op, iteration);
        op.apply(solution);
        context.statistics.record_move(op.operator_name());
        context.end_iteration(solution);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, atomic::AtomicBool};

    use super::*;
    use crate::{
        solver::{
            constraints::constraint::{compute_solution_score, default_constraints},
            metaheuristic::greedy_descent::greedy_descent,
            search_params::SearchParameters,
            statistics::SearchStatistics,
            termination::Terminator,
        },
        test_utils::{self, TestModelOptions},
    };

    fn run(attribute: TabuAttribute) {
        let model = test_utils::create_grid_model(
            3,
            3,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![5, 5]),
                demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 1]),
                distance_capacity: Some(10_000),
                span_coefficient: 1,
                pickups_deliveries: vec![(4, 8)],
            },
        );
        let mut solution = test_utils::create_test_working_solution(
            &model,
            vec![vec![4, 1, 8, 2], vec![3, 7, 5, 6]],
        );

        let params = SearchParameters {
            max_iterations: 60,
            max_iterations_without_improvement: 20,
            tabu_tenure: 5,
            ..SearchParameters::default()
        };
        let terminator = Terminator::new(&params, Arc::new(AtomicBool::new(false)));
        let mut statistics = SearchStatistics::default();
        let mut context = SearchContext::new(&params, &terminator, &mut statistics, &solution);

        greedy_descent(&mut solution, &mut context);
        let descent = context.best_objective();
        tabu_search(&mut solution, &mut context, attribute);

        let best = context.into_best();
        let (score, _) = compute_solution_score(&default_constraints(), &best);
        assert_eq!(score.hard_score, 0);
        assert!(best.objective() <= descent);
    }

    #[test]
    fn test_tabu_search() {
        run(TabuAttribute::Node);
    }

    #[test]
    fn test_generic_tabu_search() {
        run(TabuAttribute::NodeRoute);
    }

    #[test]
    fn test_tabu_list_expiry() {
        let model = test_utils::create_line_model(5, 2, TestModelOptions::default());
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2], vec![3, 4]]);
        let mut tabu = TabuList::new(TabuAttribute::Node, 2);

        let op = LocalSearchMove::InterRelocate(
            crate::solver::ls::inter_relocate::InterRelocateOperator::new(
                crate::solver::ls::inter_relocate::InterRelocateParams {
                    from_route_id: RouteIdx::new(0),
                    to_route_id: RouteIdx::new(1),
                    from: 0,
                    to: 0,
                },
            ),
        );

        tabu.record(&solution, &op, 10);
        assert!(tabu.is_tabu(&solution, &op, 11));
        assert!(!tabu.is_tabu(&solution, &op, 12));
    }
}
