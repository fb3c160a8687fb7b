use std::{fmt::Display, str::FromStr};

use jiff::SignedDuration;
use serde::Serialize;

use crate::error::ModelError;

/// Heuristic building the first complete assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FirstSolutionStrategy {
    /// Parallel cheapest insertion when the model has pickups and deliveries,
    /// path cheapest arc otherwise.
    #[default]
    Automatic,
    PathCheapestArc,
    PathMostConstrainedArc,
    LocalCheapestArc,
    GlobalCheapestArc,
    FirstUnboundMinValue,
    Savings,
    BestInsertion,
    ParallelCheapestInsertion,
    SequentialCheapestInsertion,
    LocalCheapestInsertion,
    LocalCheapestCostInsertion,
}

impl FirstSolutionStrategy {
    pub const ALL: [FirstSolutionStrategy; 12] = [
        FirstSolutionStrategy::Automatic,
        FirstSolutionStrategy::PathCheapestArc,
        FirstSolutionStrategy::PathMostConstrainedArc,
        FirstSolutionStrategy::LocalCheapestArc,
        FirstSolutionStrategy::GlobalCheapestArc,
        FirstSolutionStrategy::FirstUnboundMinValue,
        FirstSolutionStrategy::Savings,
        FirstSolutionStrategy::BestInsertion,
        FirstSolutionStrategy::ParallelCheapestInsertion,
        FirstSolutionStrategy::SequentialCheapestInsertion,
        FirstSolutionStrategy::LocalCheapestInsertion,
        FirstSolutionStrategy::LocalCheapestCostInsertion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::PathCheapestArc => "PATH_CHEAPEST_ARC",
            Self::PathMostConstrainedArc => "PATH_MOST_CONSTRAINED_ARC",
            Self::LocalCheapestArc => "LOCAL_CHEAPEST_ARC",
            Self::GlobalCheapestArc => "GLOBAL_CHEAPEST_ARC",
            Self::FirstUnboundMinValue => "FIRST_UNBOUND_MIN_VALUE",
            Self::Savings => "SAVINGS",
            Self::BestInsertion => "BEST_INSERTION",
            Self::ParallelCheapestInsertion => "PARALLEL_CHEAPEST_INSERTION",
            Self::SequentialCheapestInsertion => "SEQUENTIAL_CHEAPEST_INSERTION",
            Self::LocalCheapestInsertion => "LOCAL_CHEAPEST_INSERTION",
            Self::LocalCheapestCostInsertion => "LOCAL_CHEAPEST_COST_INSERTION",
        }
    }
}

impl Display for FirstSolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for FirstSolutionStrategy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for FirstSolutionStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FirstSolutionStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ModelError::UnknownStrategy(s.to_string()))
    }
}

/// Improvement procedure run after the first solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LocalSearchMetaheuristic {
    /// Greedy descent.
    #[default]
    Automatic,
    GreedyDescent,
    GuidedLocalSearch,
    SimulatedAnnealing,
    TabuSearch,
    GenericTabuSearch,
}

impl LocalSearchMetaheuristic {
    pub const ALL: [LocalSearchMetaheuristic; 6] = [
        LocalSearchMetaheuristic::Automatic,
        LocalSearchMetaheuristic::GreedyDescent,
        LocalSearchMetaheuristic::GuidedLocalSearch,
        LocalSearchMetaheuristic::SimulatedAnnealing,
        LocalSearchMetaheuristic::TabuSearch,
        LocalSearchMetaheuristic::GenericTabuSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::GreedyDescent => "GREEDY_DESCENT",
            Self::GuidedLocalSearch => "GUIDED_LOCAL_SEARCH",
            Self::SimulatedAnnealing => "SIMULATED_ANNEALING",
            Self::TabuSearch => "TABU_SEARCH",
            Self::GenericTabuSearch => "GENERIC_TABU_SEARCH",
        }
    }

    /// The concrete procedure `Automatic` stands for.
    pub fn resolve(self) -> Self {
        match self {
            Self::Automatic => Self::GreedyDescent,
            other => other,
        }
    }
}

impl Display for LocalSearchMetaheuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for LocalSearchMetaheuristic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for LocalSearchMetaheuristic {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocalSearchMetaheuristic::ALL
            .into_iter()
            .find(|metaheuristic| metaheuristic.as_str() == s)
            .ok_or_else(|| ModelError::UnknownStrategy(s.to_string()))
    }
}

#[derive(Clone, Debug)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SearchParameters {
    pub first_solution_strategy: FirstSolutionStrategy,
    /// Greedy descent still runs when unset.
    pub local_search_metaheuristic: Option<LocalSearchMetaheuristic>,
    pub time_limit: Option<SignedDuration>,
    pub threads: Threads,

    /// Metaheuristic iterations allowed without improving the best solution.
    pub max_iterations_without_improvement: usize,
    pub max_iterations: usize,
    pub seed: u64,

    /// Scales the penalty term of guided local search, relative to the average arc cost.
    pub guided_local_search_lambda_coefficient: f64,
    pub tabu_tenure: usize,
    /// Initial temperature, relative to the average arc cost of the first solution.
    pub simulated_annealing_initial_temperature: f64,
    pub simulated_annealing_cooling_rate: f64,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            first_solution_strategy: FirstSolutionStrategy::Automatic,
            local_search_metaheuristic: None,
            time_limit: None,
            threads: Threads::Auto,
            max_iterations_without_improvement: 500,
            max_iterations: 100_000,
            seed: 0,
            guided_local_search_lambda_coefficient: 0.1,
            tabu_tenure: 10,
            simulated_annealing_initial_temperature: 1.0,
            simulated_annealing_cooling_rate: 0.995,
        }
    }
}
