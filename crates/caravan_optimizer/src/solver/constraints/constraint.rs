use crate::{
    model::routing_model::RoutingModel,
    solver::{
        score::{Score, ScoreAnalysis, ScoreLevel},
        solution::working_solution::WorkingSolution,
    },
};

use super::{
    arc_cost_constraint::ArcCostConstraint,
    dimension_capacity_constraint::DimensionCapacityConstraint,
    global_constraint::{GlobalConstraint, GlobalConstraintType},
    global_span_constraint::GlobalSpanConstraint,
    pickup_delivery_constraint::PickupDeliveryConstraint,
    route_constraint::{RouteConstraint, RouteConstraintType},
    unassigned_node_constraint::UnassignedNodeConstraint,
};

/// Full re-evaluation of a solution, used to check what the incremental evaluation produced.
#[derive(Clone)]
pub enum Constraint {
    Global(GlobalConstraintType),
    Route(RouteConstraintType),
}

impl Constraint {
    pub fn score_level(&self) -> ScoreLevel {
        match self {
            Constraint::Global(constraint) => constraint.score_level(),
            Constraint::Route(constraint) => constraint.score_level(),
        }
    }

    pub fn compute_score(&self, model: &RoutingModel, solution: &WorkingSolution) -> Score {
        match self {
            Constraint::Global(constraint) => constraint.compute_score(solution),
            Constraint::Route(constraint) => solution
                .non_empty_routes_iter()
                .fold(Score::zero(), |acc, route| {
                    acc + constraint.compute_score(model, route)
                }),
        }
    }

    pub fn constraint_name(&self) -> &'static str {
        match self {
            Constraint::Global(c) => c.constraint_name(),
            Constraint::Route(c) => c.constraint_name(),
        }
    }
}

pub fn default_constraints() -> Vec<Constraint> {
    vec![
        Constraint::Global(GlobalConstraintType::ArcCost(ArcCostConstraint)),
        Constraint::Global(GlobalConstraintType::GlobalSpan(GlobalSpanConstraint)),
        Constraint::Global(GlobalConstraintType::UnassignedNodes(
            UnassignedNodeConstraint,
        )),
        Constraint::Route(RouteConstraintType::DimensionCapacity(
            DimensionCapacityConstraint,
        )),
        Constraint::Route(RouteConstraintType::PickupDelivery(
            PickupDeliveryConstraint,
        )),
    ]
}

pub fn compute_solution_score(
    constraints: &[Constraint],
    solution: &WorkingSolution,
) -> (Score, ScoreAnalysis) {
    let mut analysis = ScoreAnalysis::default();

    for constraint in constraints {
        let score = constraint.compute_score(solution.model(), solution);
        analysis
            .scores
            .entry(constraint.constraint_name())
            .and_modify(|entry| *entry += score)
            .or_insert(score);
    }

    (analysis.total_score(), analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, TestModelOptions};

    #[test]
    fn test_soft_score_is_objective() {
        let model = test_utils::create_line_model(
            7,
            2,
            TestModelOptions {
                distance_capacity: Some(100),
                span_coefficient: 3,
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3], vec![6, 5]]);

        let (score, analysis) = compute_solution_score(&default_constraints(), &solution);

        assert_eq!(score.hard_score, 1);
        assert_eq!(score.soft_score, solution.objective());
        assert_eq!(analysis.scores["unassigned_nodes"], Score::hard(1));
        assert_eq!(analysis.scores["global_span_cost"], Score::soft(3 * (12 - 6)));
    }
}
