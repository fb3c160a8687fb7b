use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

use crate::solver::search_params::{FirstSolutionStrategy, LocalSearchMetaheuristic};

#[derive(Serialize, Debug, Clone)]
pub struct ObjectiveEvolutionRow {
    pub timestamp: Timestamp,
    pub iteration: usize,
    pub objective: i64,
}

/// Counters collected while solving.
#[derive(Default, Serialize, Debug, Clone)]
pub struct SearchStatistics {
    pub first_solution_strategy: Option<FirstSolutionStrategy>,
    pub first_solution_objective: Option<i64>,
    pub first_solution_duration: Option<SignedDuration>,
    pub fallback_used: bool,
    /// Heuristic that produced the first solution when the requested one left nodes out.
    pub fallback_strategy: Option<FirstSolutionStrategy>,
    pub local_search_metaheuristic: Option<LocalSearchMetaheuristic>,
    pub local_search_duration: Option<SignedDuration>,
    pub iterations: usize,
    pub improvements: usize,
    pub applied_moves: FxHashMap<&'static str, usize>,
    pub objective_evolution: Vec<ObjectiveEvolutionRow>,
}

impl SearchStatistics {
    pub fn record_move(&mut self, operator_name: &'static str) {
        self.applied_moves
            .entry(operator_name)
            .and_modify(|entry| *entry += 1)
            .or_insert(1);
    }

    pub fn record_best(&mut self, iteration: usize, objective: i64) {
        self.improvements += 1;
        self.objective_evolution.push(ObjectiveEvolutionRow {
            timestamp: Timestamp::now(),
            iteration,
            objective,
        });
    }
}
