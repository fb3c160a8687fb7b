use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use caravan_optimizer::{
    json::types::JsonRoutingProblem,
    solver::{
        search::SolveOutcome,
        search_params::{FirstSolutionStrategy, LocalSearchMetaheuristic, Threads},
        solver::Solver,
    },
};
use clap::Args;
use tracing::{info, warn};

use crate::{parsers, report};

#[derive(Args)]
pub struct SolveArgs {
    /// JSON routing problem
    #[arg(short, long)]
    input: PathBuf,

    /// Overrides the first solution strategy of the input (e.g., "PATH_CHEAPEST_ARC")
    #[arg(long, value_parser = parsers::parse_first_solution_strategy)]
    strategy: Option<FirstSolutionStrategy>,

    /// Overrides the local search metaheuristic of the input (e.g., "GUIDED_LOCAL_SEARCH")
    #[arg(long, value_parser = parsers::parse_metaheuristic)]
    metaheuristic: Option<LocalSearchMetaheuristic>,

    /// Time limit for the search (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Prints the solution as JSON instead of the itinerary
    #[arg(long)]
    json: bool,
}

pub fn run(args: SolveArgs) -> Result<(), anyhow::Error> {
    info!("Solving {:?}", args.input);

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;
    let problem: JsonRoutingProblem =
        serde_json::from_str(&content).context("invalid routing problem")?;

    let model = Arc::new(problem.build_model()?);
    let mut params = problem.search_parameters()?;

    if let Some(strategy) = args.strategy {
        params.first_solution_strategy = strategy;
    }
    if let Some(metaheuristic) = args.metaheuristic {
        params.local_search_metaheuristic = Some(metaheuristic);
    }
    if let Some(timeout) = args.timeout {
        params.time_limit = Some(timeout);
    }
    if let Some(threads) = args.threads {
        params.threads = Threads::Multi(threads);
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    let solver = Solver::new(model, params);
    let outcome = solver.solve();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        SolveOutcome::Solved(solution) => report::print_solution(&solution),
        SolveOutcome::Infeasible(reason) => warn!("No solution found: {reason}"),
    }

    Ok(())
}
