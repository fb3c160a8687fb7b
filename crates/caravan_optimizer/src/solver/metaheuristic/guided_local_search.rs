use std::sync::Arc;

use tracing::{Level, debug, instrument};

use crate::solver::{
    metaheuristic::search_context::SearchContext,
    solution::{
        arc_penalties::ArcPenalties, route_change::MoveEvaluation,
        working_solution::WorkingSolution,
    },
};

/// Weight of one penalty unit, `coefficient` times the average arc cost of the solution.
fn penalty_factor(solution: &WorkingSolution, coefficient: f64) -> i64 {
    let arcs: usize = solution
        .non_empty_routes_iter()
        .map(|route| route.len() + 1)
        .sum();

    if arcs == 0 {
        return 1;
    }

    let average = solution.transport_cost() as f64 / arcs as f64;
    ((coefficient * average).round() as i64).max(1)
}

/// Penalizes the arcs of the solution with the highest utility `cost / (1 + penalty)`.
fn penalize(solution: &WorkingSolution, penalties: &mut ArcPenalties) -> usize {
    let model = solution.model();
    let mut max_utility = f64::MIN;
    let mut selected = Vec::new();

    for route in solution.non_empty_routes_iter() {
        for position in 0..=route.len() {
            let from = route.ext_node(position);
            let to = route.ext_node(position + 1);
            let utility = model.arc_cost(from, to) as f64 / (1 + penalties.get(from, to)) as f64;

            if utility > max_utility {
                max_utility = utility;
                selected.clear();
            }
            if utility == max_utility {
                selected.push((from, to));
            }
        }
    }

    for &(from, to) in &selected {
        penalties.increment(from, to);
    }

    selected.len()
}

/// Guided local search: at each local optimum the most expensive arcs relative to their
/// penalty get penalized, and the descent continues on the augmented objective.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn guided_local_search(solution: &mut WorkingSolution, context: &mut SearchContext) {
    let lambda = penalty_factor(solution, context.params.guided_local_search_lambda_coefficient);
    let mut penalties = ArcPenalties::new(solution.model().num_nodes());

    debug!(lambda, "Guided local search penalty factor");

    let augmented = |evaluation: &MoveEvaluation| evaluation.augmented_delta(lambda);

    while !context.should_terminate() {
        match context.local_search.improve(solution, &augmented) {
            Some(applied) => {
                context.record_move(&applied);
            }
            None => {
                let penalized = penalize(solution, &mut penalties);
                solution.set_penalties(Some(Arc::new(penalties.clone())));
                context.local_search.clear();

                if penalized == 0 {
                    break;
                }
            }
        }

        context.end_iteration(solution);
    }

    solution.set_penalties(None);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::*;
    use crate::{
        problem::node::NodeIdx,
        solver::{
            constraints::constraint::{compute_solution_score, default_constraints},
            metaheuristic::greedy_descent::greedy_descent,
            search_params::SearchParameters,
            statistics::SearchStatistics,
            termination::Terminator,
        },
        test_utils::{self, TestModelOptions},
    };

    #[test]
    fn test_penalize_selects_most_expensive_arcs() {
        let model = test_utils::create_line_model(4, 1, TestModelOptions::default());
        let solution = test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3]]);
        let mut penalties = ArcPenalties::new(model.num_nodes());

        assert_eq!(penalize(&solution, &mut penalties), 1);
        assert_eq!(penalties.get(NodeIdx::new(3), NodeIdx::new(0)), 1);

        // 3 -> 0 is still the highest at 3 / 2
        assert_eq!(penalize(&solution, &mut penalties), 1);
        assert_eq!(penalties.get(NodeIdx::new(3), NodeIdx::new(0)), 2);
        // 3 / 3 ties with every unit arc
        assert_eq!(penalize(&solution, &mut penalties), 4);
        assert_eq!(penalties.total(), 6);
    }

    #[test]
    fn test_guided_local_search_keeps_best_and_feasibility() {
        let model = test_utils::create_grid_model(
            3,
            4,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![6, 6]),
                demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );
        let mut solution = test_utils::create_test_working_solution(
            &model,
            vec![vec![11, 1, 9, 3, 5], vec![2, 10, 4, 8, 6, 7]],
        );

        let params = SearchParameters {
            max_iterations: 300,
            max_iterations_without_improvement: 100,
            ..SearchParameters::default()
        };
        let terminator = Terminator::new(&params, Arc::new(AtomicBool::new(false)));
        let mut statistics = SearchStatistics::default();
        let mut context = SearchContext::new(&params, &terminator, &mut statistics, &solution);

        greedy_descent(&mut solution, &mut context);
        let descent = context.best_objective();
        guided_local_search(&mut solution, &mut context);

        let best = context.into_best();
        let (score, _) = compute_solution_score(&default_constraints(), &best);
        assert_eq!(score.hard_score, 0);
        assert!(best.is_complete());
        assert!(best.objective() <= descent);
        assert!(best.penalties().is_none());
    }
}
