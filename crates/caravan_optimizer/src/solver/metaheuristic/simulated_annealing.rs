use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{Level, debug, instrument};

use crate::solver::{
    metaheuristic::search_context::SearchContext, solution::working_solution::WorkingSolution,
};

const MIN_TEMPERATURE: f64 = 1e-3;

fn initial_temperature(solution: &WorkingSolution, coefficient: f64) -> f64 {
    let arcs: usize = solution
        .non_empty_routes_iter()
        .map(|route| route.len() + 1)
        .sum();

    if arcs == 0 {
        return coefficient;
    }

    coefficient * solution.transport_cost() as f64 / arcs as f64
}

/// Metropolis acceptance of a random neighbour, the temperature shrinking geometrically.
///
/// The temperature starts at the configured value times the average arc cost. Once it is
/// negligible the search keeps accepting only improving moves. A draw without any feasible
/// move still counts as an iteration.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn simulated_annealing(solution: &mut WorkingSolution, context: &mut SearchContext) {
    let mut rng = SmallRng::seed_from_u64(context.params.seed);
    let mut temperature = initial_temperature(
        solution,
        context.params.simulated_annealing_initial_temperature,
    );
    let cooling_rate = context.params.simulated_annealing_cooling_rate;

    debug!(temperature, cooling_rate, "Simulated annealing initial temperature");

    while !context.should_terminate() {
        let Some((op, evaluation)) = context.local_search.random_move(solution, &mut rng) else {
            temperature *= cooling_rate;
            context.end_iteration(solution);
            continue;
        };

        let delta = evaluation.cost_delta;
        let accept = delta <= 0
            || (temperature > MIN_TEMPERATURE
                && rng.random_bool((-(delta as f64) / temperature).exp().clamp(0.0, 1.0)));

        if accept {
            op.apply(solution);
            context.statistics.record_move(op.operator_name());
        }

        temperature *= cooling_rate;
        context.end_iteration(solution);
    }
}
