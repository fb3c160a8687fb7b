use crate::solver::{
    score::{Score, ScoreLevel},
    solution::working_solution::WorkingSolution,
};

use super::global_constraint::GlobalConstraint;

/// Coefficient times the spread of the end cumuls, for every dimension with a coefficient.
#[derive(Clone)]
pub struct GlobalSpanConstraint;

impl GlobalConstraint for GlobalSpanConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn compute_score(&self, solution: &WorkingSolution) -> Score {
        Score::of(self.score_level(), solution.span_cost())
    }
}
