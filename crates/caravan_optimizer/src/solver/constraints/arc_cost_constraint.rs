use crate::solver::{
    score::{Score, ScoreLevel},
    solution::working_solution::WorkingSolution,
};

use super::global_constraint::GlobalConstraint;

#[derive(Clone)]
pub struct ArcCostConstraint;

const SCORE_LEVEL: ScoreLevel = ScoreLevel::Soft;

impl GlobalConstraint for ArcCostConstraint {
    fn score_level(&self) -> ScoreLevel {
        SCORE_LEVEL
    }

    fn compute_score(&self, solution: &WorkingSolution) -> Score {
        Score::of(self.score_level(), solution.transport_cost())
    }
}
