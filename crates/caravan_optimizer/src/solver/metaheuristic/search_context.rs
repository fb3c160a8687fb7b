use crate::solver::{
    ls::local_search::{AppliedMove, LocalSearch},
    search_params::SearchParameters,
    solution::working_solution::WorkingSolution,
    statistics::SearchStatistics,
    termination::Terminator,
};

/// State shared by every metaheuristic: budget, statistics and the best solution so far.
pub struct SearchContext<'a> {
    pub params: &'a SearchParameters,
    pub terminator: &'a Terminator,
    pub statistics: &'a mut SearchStatistics,
    pub local_search: LocalSearch,
    iteration: usize,
    iterations_without_improvement: usize,
    best: WorkingSolution,
    best_objective: i64,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        params: &'a SearchParameters,
        terminator: &'a Terminator,
        statistics: &'a mut SearchStatistics,
        initial: &WorkingSolution,
    ) -> Self {
        SearchContext {
            params,
            terminator,
            statistics,
            local_search: LocalSearch::new(initial.model()),
            iteration: 0,
            iterations_without_improvement: 0,
            best_objective: initial.objective(),
            best: initial.clone(),
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn should_terminate(&self) -> bool {
        self.terminator
            .should_terminate(self.iteration, self.iterations_without_improvement)
    }

    /// Counts one iteration and keeps `solution` when it beats the best one.
    pub fn end_iteration(&mut self, solution: &WorkingSolution) -> bool {
        self.iteration += 1;
        self.statistics.iterations = self.iteration;

        let objective = solution.objective();
        if objective < self.best_objective {
            self.best_objective = objective;
            self.best = solution.clone();
            self.iterations_without_improvement = 0;
            self.statistics.record_best(self.iteration, objective);
            true
        } else {
            self.iterations_without_improvement += 1;
            false
        }
    }

    pub fn record_move(&mut self, applied: &AppliedMove) {
        self.statistics.record_move(applied.operator_name);
    }

    pub fn best_objective(&self) -> i64 {
        self.best_objective
    }

    pub fn best(&self) -> &WorkingSolution {
        &self.best
    }

    /// Best solution found, without guided local search penalties.
    pub fn into_best(self) -> WorkingSolution {
        let mut best = self.best;
        if best.penalties().is_some() {
            best.set_penalties(None);
        }
        best
    }
}
