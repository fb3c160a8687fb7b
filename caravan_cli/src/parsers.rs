use caravan_optimizer::solver::search_params::{FirstSolutionStrategy, LocalSearchMetaheuristic};
use jiff::SpanRelativeTo;

/// Accepts "30s", "5m", ISO 8601 durations or a number of seconds.
pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    // plain seconds, as in the time_limit_seconds of problem files
    if let Ok(seconds) = input.parse::<f64>()
        && let Ok(duration) = jiff::SignedDuration::try_from_secs_f64(seconds.abs())
    {
        return Ok(duration);
    }

    Err(format!("invalid duration '{input}'"))
}

pub fn parse_first_solution_strategy(input: &str) -> Result<FirstSolutionStrategy, String> {
    input
        .to_uppercase()
        .parse()
        .map_err(|error| format!("{error}"))
}

pub fn parse_metaheuristic(input: &str) -> Result<LocalSearchMetaheuristic, String> {
    input
        .to_uppercase()
        .parse()
        .map_err(|error| format!("{error}"))
}
