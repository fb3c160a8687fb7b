use std::sync::{Arc, atomic::AtomicBool};

use jiff::Timestamp;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{Level, error, info, instrument, warn};

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        constraints::constraint::{compute_solution_score, default_constraints},
        construction::construct_solution::construct_solution,
        metaheuristic::{
            greedy_descent::greedy_descent,
            guided_local_search::guided_local_search,
            search_context::SearchContext,
            simulated_annealing::simulated_annealing,
            tabu_search::{TabuAttribute, tabu_search},
        },
        search_params::{LocalSearchMetaheuristic, SearchParameters},
        solution::{routing_solution::RoutingSolution, working_solution::WorkingSolution},
        statistics::SearchStatistics,
        termination::Terminator,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SolverStatus {
    Configured,
    FirstSolutionSearching,
    LocalSearchImproving,
    Solved,
    Infeasible,
}

/// Result of a solve. Solving has no errors: either an assignment or the reason there is none.
#[derive(Debug, Clone, Serialize)]
pub enum SolveOutcome {
    Solved(Box<RoutingSolution>),
    Infeasible(String),
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&RoutingSolution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution.as_ref()),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolveOutcome::Infeasible(_))
    }
}

/// First solution then local search, on a dedicated thread pool.
pub struct Search {
    model: Arc<RoutingModel>,
    params: SearchParameters,
    is_stopped: Arc<AtomicBool>,
    status: Arc<RwLock<SolverStatus>>,
}

impl Search {
    pub fn new(
        model: Arc<RoutingModel>,
        params: SearchParameters,
        is_stopped: Arc<AtomicBool>,
        status: Arc<RwLock<SolverStatus>>,
    ) -> Self {
        Search {
            model,
            params,
            is_stopped,
            status,
        }
    }

    fn create_thread_pool(&self) -> Option<rayon::ThreadPool> {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.threads.number_of_threads())
            .build()
        {
            Ok(pool) => Some(pool),
            Err(error) => {
                warn!(%error, "Could not create the search thread pool, using the global pool");
                None
            }
        }
    }

    fn set_status(&self, status: SolverStatus) {
        *self.status.write() = status;
    }

    pub fn run(&self) -> SolveOutcome {
        match self.create_thread_pool() {
            Some(pool) => pool.install(|| self.search()),
            None => self.search(),
        }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    fn search(&self) -> SolveOutcome {
        let terminator = Terminator::new(&self.params, Arc::clone(&self.is_stopped));
        let mut statistics = SearchStatistics::default();

        self.set_status(SolverStatus::FirstSolutionSearching);
        let started = Timestamp::now();

        let first = match construct_solution(
            Arc::clone(&self.model),
            self.params.first_solution_strategy,
        ) {
            Ok(first) => first,
            Err(reason) => {
                warn!(%reason, "No feasible assignment");
                self.set_status(SolverStatus::Infeasible);
                return SolveOutcome::Infeasible(reason);
            }
        };

        statistics.first_solution_strategy = Some(first.strategy);
        statistics.first_solution_objective = Some(first.solution.objective());
        statistics.first_solution_duration = Some(Timestamp::now().duration_since(started));
        statistics.fallback_used = first.fallback_used;
        statistics.fallback_strategy = first.fallback_strategy;

        let mut solution = first.solution;

        if !terminator.is_interrupted() {
            self.set_status(SolverStatus::LocalSearchImproving);
            solution = self.improve(solution, &terminator, &mut statistics);
        }

        let time_limited = terminator.is_interrupted();
        info!(
            objective = solution.objective(),
            iterations = statistics.iterations,
            time_limited,
            elapsed = %terminator.elapsed(),
            "Search finished"
        );

        let (score, score_analysis) = compute_solution_score(&default_constraints(), &solution);
        if score.is_failure() {
            let violated = score_analysis
                .scores
                .iter()
                .filter(|(_, score)| score.is_failure())
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ");
            error!(?score_analysis, "Final assignment violates hard constraints");
            self.set_status(SolverStatus::Infeasible);
            return SolveOutcome::Infeasible(format!(
                "final assignment violates hard constraints: {violated}"
            ));
        }
        debug_assert_eq!(score.soft_score, solution.objective());

        self.set_status(SolverStatus::Solved);
        SolveOutcome::Solved(Box::new(RoutingSolution::new(
            &solution,
            score_analysis,
            time_limited,
            statistics,
        )))
    }

    fn improve(
        &self,
        mut solution: WorkingSolution,
        terminator: &Terminator,
        statistics: &mut SearchStatistics,
    ) -> WorkingSolution {
        let started = Timestamp::now();
        let metaheuristic = self
            .params
            .local_search_metaheuristic
            .map(LocalSearchMetaheuristic::resolve);
        statistics.local_search_metaheuristic = metaheuristic;

        let mut context = SearchContext::new(&self.params, terminator, statistics, &solution);

        let local_optimum = greedy_descent(&mut solution, &mut context);

        if local_optimum {
            match metaheuristic {
                None
                | Some(LocalSearchMetaheuristic::Automatic)
                | Some(LocalSearchMetaheuristic::GreedyDescent) => {}
                Some(LocalSearchMetaheuristic::GuidedLocalSearch) => {
                    guided_local_search(&mut solution, &mut context);
                }
                Some(LocalSearchMetaheuristic::SimulatedAnnealing) => {
                    simulated_annealing(&mut solution, &mut context);
                }
                Some(LocalSearchMetaheuristic::TabuSearch) => {
                    tabu_search(&mut solution, &mut context, TabuAttribute::Node);
                }
                Some(LocalSearchMetaheuristic::GenericTabuSearch) => {
                    tabu_search(&mut solution, &mut context, TabuAttribute::NodeRoute);
                }
            }
        }

        let best = context.into_best();
        statistics.local_search_duration = Some(Timestamp::now().duration_since(started));
        best
    }
}
