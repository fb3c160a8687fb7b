use crate::solver::{
    score::{Score, ScoreLevel},
    solution::working_solution::WorkingSolution,
};

use super::global_constraint::GlobalConstraint;

#[derive(Clone)]
pub struct UnassignedNodeConstraint;

const SCORE_LEVEL: ScoreLevel = ScoreLevel::Hard;

impl GlobalConstraint for UnassignedNodeConstraint {
    fn score_level(&self) -> ScoreLevel {
        SCORE_LEVEL
    }

    fn compute_score(&self, solution: &WorkingSolution) -> Score {
        Score::of(
            self.score_level(),
            solution.unassigned_nodes().len() as i64,
        )
    }
}
