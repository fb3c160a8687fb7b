use tracing::{Level, debug, instrument};

use crate::solver::{
    metaheuristic::search_context::SearchContext, solution::route_change::MoveEvaluation,
    solution::working_solution::WorkingSolution,
};

pub fn objective_delta(evaluation: &MoveEvaluation) -> i64 {
    evaluation.cost_delta
}

/// Applies the best improving move until none is left or the budget runs out.
///
/// Returns whether a local optimum was reached.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn greedy_descent(solution: &mut WorkingSolution, context: &mut SearchContext) -> bool {
    while !context.should_terminate() {
        match context.local_search.improve(solution, &objective_delta) {
            Some(applied) => {
                context.record_move(&applied);
                context.end_iteration(solution);
            }
            None => {
                debug!(
                    iteration = context.iteration(),
                    objective = solution.objective(),
                    "Local optimum reached"
                );
                return true;
            }
        }
    }

    false
}
