use crate::solver::{
    score::{Score, ScoreLevel},
    solution::working_solution::WorkingSolution,
};

use super::{
    arc_cost_constraint::ArcCostConstraint, global_span_constraint::GlobalSpanConstraint,
    unassigned_node_constraint::UnassignedNodeConstraint,
};

pub trait GlobalConstraint {
    fn score_level(&self) -> ScoreLevel;
    fn compute_score(&self, solution: &WorkingSolution) -> Score;
}

#[derive(Clone)]
pub enum GlobalConstraintType {
    ArcCost(ArcCostConstraint),
    GlobalSpan(GlobalSpanConstraint),
    UnassignedNodes(UnassignedNodeConstraint),
}

impl GlobalConstraintType {
    pub fn constraint_name(&self) -> &'static str {
        match self {
            Self::ArcCost(_) => "arc_cost",
            Self::GlobalSpan(_) => "global_span_cost",
            Self::UnassignedNodes(_) => "unassigned_nodes",
        }
    }
}

impl GlobalConstraint for GlobalConstraintType {
    fn score_level(&self) -> ScoreLevel {
        match self {
            Self::ArcCost(constraint) => constraint.score_level(),
            Self::GlobalSpan(constraint) => constraint.score_level(),
            Self::UnassignedNodes(constraint) => constraint.score_level(),
        }
    }

    fn compute_score(&self, solution: &WorkingSolution) -> Score {
        match self {
            Self::ArcCost(constraint) => constraint.compute_score(solution),
            Self::GlobalSpan(constraint) => constraint.compute_score(solution),
            Self::UnassignedNodes(constraint) => constraint.compute_score(solution),
        }
    }
}
