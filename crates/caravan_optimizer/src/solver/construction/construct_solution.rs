use std::sync::Arc;

use tracing::{Level, debug, info, instrument, warn};

use crate::{
    model::routing_model::{NodeRole, RoutingModel},
    solver::{
        construction::{
            cheapest_insertion::{
                best_insertion, local_cheapest_cost_insertion, local_cheapest_insertion,
                parallel_cheapest_insertion, sequential_cheapest_insertion,
            },
            path_cheapest_arc::{
                first_unbound_min_value, global_cheapest_arc, local_cheapest_arc,
                path_cheapest_arc, path_most_constrained_arc,
            },
            savings::savings,
        },
        search_params::FirstSolutionStrategy,
        solution::working_solution::WorkingSolution,
    },
};

/// Complete assignment produced by a first-solution heuristic.
pub struct FirstSolution {
    pub solution: WorkingSolution,
    /// Strategy actually run, `Automatic` resolved.
    pub strategy: FirstSolutionStrategy,
    /// The strategy left nodes out and another heuristic started over.
    pub fallback_used: bool,
    pub fallback_strategy: Option<FirstSolutionStrategy>,
}

pub fn resolve_strategy(
    model: &RoutingModel,
    strategy: FirstSolutionStrategy,
) -> FirstSolutionStrategy {
    match strategy {
        FirstSolutionStrategy::Automatic if model.has_pickup_delivery_constraint() => {
            FirstSolutionStrategy::ParallelCheapestInsertion
        }
        FirstSolutionStrategy::Automatic => FirstSolutionStrategy::PathCheapestArc,
        strategy => strategy,
    }
}

/// Necessary conditions on capacities that no assignment can get around.
///
/// Every stop is entered once, so each dimension needs at least the cheapest incoming
/// transit of every stop across the fleet. A single route must hold at least the cheapest
/// way in and out of a stop, or of both nodes of a pair.
pub fn check_structural_feasibility(model: &RoutingModel) -> Result<(), String> {
    let data = model.data();

    for dimension in model.dimensions() {
        let transits = dimension.transits();
        let fleet_capacity: i64 = dimension.vehicle_capacities().iter().sum();
        let max_capacity = dimension
            .vehicle_capacities()
            .iter()
            .copied()
            .max()
            .unwrap_or(0);

        let required: i64 = data.stops().map(|node| transits.min_incoming(node)).sum();
        if required > fleet_capacity {
            return Err(format!(
                "dimension '{}' requires at least {required} but the fleet capacity is {fleet_capacity}",
                dimension.name()
            ));
        }

        for node in data.stops() {
            let needed = match model.node_role(node) {
                NodeRole::Regular => transits.min_incoming(node) + transits.min_outgoing(node),
                NodeRole::Pickup { delivery } => {
                    transits.min_incoming(node)
                        + transits.min_incoming(delivery)
                        + transits.min_outgoing(delivery)
                }
                NodeRole::Delivery { .. } => continue,
            };

            if needed > max_capacity {
                return Err(format!(
                    "node {node} needs at least {needed} on dimension '{}' but the largest vehicle capacity is {max_capacity}",
                    dimension.name()
                ));
            }
        }
    }

    Ok(())
}

pub fn run_strategy(solution: &mut WorkingSolution, strategy: FirstSolutionStrategy) {
    match strategy {
        FirstSolutionStrategy::Automatic => {
            let resolved = resolve_strategy(solution.model(), strategy);
            run_strategy(solution, resolved);
        }
        FirstSolutionStrategy::PathCheapestArc => path_cheapest_arc(solution),
        FirstSolutionStrategy::PathMostConstrainedArc => path_most_constrained_arc(solution),
        FirstSolutionStrategy::LocalCheapestArc => local_cheapest_arc(solution),
        FirstSolutionStrategy::GlobalCheapestArc => global_cheapest_arc(solution),
        FirstSolutionStrategy::FirstUnboundMinValue => first_unbound_min_value(solution),
        FirstSolutionStrategy::Savings => savings(solution),
        FirstSolutionStrategy::BestInsertion => best_insertion(solution),
        FirstSolutionStrategy::ParallelCheapestInsertion => parallel_cheapest_insertion(solution),
        FirstSolutionStrategy::SequentialCheapestInsertion => {
            sequential_cheapest_insertion(solution)
        }
        FirstSolutionStrategy::LocalCheapestInsertion => local_cheapest_insertion(solution),
        FirstSolutionStrategy::LocalCheapestCostInsertion => {
            local_cheapest_cost_insertion(solution)
        }
    }
}

/// Heuristics tried in turn when the requested strategy leaves nodes unassigned.
const FALLBACK_STRATEGIES: [FirstSolutionStrategy; 8] = [
    FirstSolutionStrategy::Savings,
    FirstSolutionStrategy::GlobalCheapestArc,
    FirstSolutionStrategy::PathMostConstrainedArc,
    FirstSolutionStrategy::BestInsertion,
    FirstSolutionStrategy::SequentialCheapestInsertion,
    FirstSolutionStrategy::LocalCheapestInsertion,
    FirstSolutionStrategy::ParallelCheapestInsertion,
    FirstSolutionStrategy::PathCheapestArc,
];

/// Builds a complete first solution, or explains why none exists.
///
/// The solve is infeasible only when the structural check fails or every heuristic leaves
/// nodes out.
#[instrument(skip_all, level = Level::DEBUG)]
pub fn construct_solution(
    model: Arc<RoutingModel>,
    strategy: FirstSolutionStrategy,
) -> Result<FirstSolution, String> {
    check_structural_feasibility(&model)?;

    let strategy = resolve_strategy(&model, strategy);
    let mut solution = WorkingSolution::new(Arc::clone(&model));
    run_strategy(&mut solution, strategy);

    if solution.is_complete() {
        info!(
            strategy = %strategy,
            objective = solution.objective(),
            "First solution found"
        );
        return Ok(FirstSolution {
            solution,
            strategy,
            fallback_used: false,
            fallback_strategy: None,
        });
    }

    let mut unassigned = solution.unassigned_nodes().len();
    warn!(
        strategy = %strategy,
        unassigned,
        "First solution strategy left nodes unassigned, trying other heuristics"
    );

    for fallback in FALLBACK_STRATEGIES {
        if fallback == strategy {
            continue;
        }

        let mut solution = WorkingSolution::new(Arc::clone(&model));
        run_strategy(&mut solution, fallback);

        if solution.is_complete() {
            info!(
                strategy = %fallback,
                objective = solution.objective(),
                "Fallback found a first solution"
            );
            return Ok(FirstSolution {
                solution,
                strategy,
                fallback_used: true,
                fallback_strategy: Some(fallback),
            });
        }

        unassigned = unassigned.min(solution.unassigned_nodes().len());
        debug!(
            strategy = %fallback,
            unassigned = solution.unassigned_nodes().len(),
            "Fallback failed"
        );
    }

    Err(format!(
        "no feasible assignment found, at least {unassigned} nodes could not be placed by any heuristic"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, TestModelOptions};

    #[test]
    fn test_automatic_resolution() {
        let plain = test_utils::create_line_model(4, 1, TestModelOptions::default());
        assert_eq!(
            resolve_strategy(&plain, FirstSolutionStrategy::Automatic),
            FirstSolutionStrategy::PathCheapestArc
        );

        let paired = test_utils::create_line_model(
            4,
            1,
            TestModelOptions {
                distance_capacity: Some(100),
                pickups_deliveries: vec![(1, 2)],
                ..TestModelOptions::default()
            },
        );
        assert_eq!(
            resolve_strategy(&paired, FirstSolutionStrategy::Automatic),
            FirstSolutionStrategy::ParallelCheapestInsertion
        );
        assert_eq!(
            resolve_strategy(&paired, FirstSolutionStrategy::Savings),
            FirstSolutionStrategy::Savings
        );
    }

    #[test]
    fn test_structural_infeasibility_on_total_demand() {
        let model = test_utils::create_line_model(
            4,
            1,
            TestModelOptions {
                vehicle_capacities: Some(vec![2]),
                demands: Some(vec![0, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );

        assert!(check_structural_feasibility(&model).is_err());
        assert!(construct_solution(model, FirstSolutionStrategy::Automatic).is_err());
    }

    #[test]
    fn test_every_strategy_finds_a_complete_solution() {
        let model = test_utils::create_grid_model(
            3,
            4,
            3,
            TestModelOptions {
                vehicle_capacities: Some(vec![5, 5, 5]),
                demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );

        for strategy in FirstSolutionStrategy::ALL {
            let first = construct_solution(model.clone(), strategy).unwrap();
            assert!(first.solution.is_complete(), "{strategy} left nodes out");
            assert_ne!(first.strategy, FirstSolutionStrategy::Automatic);
        }
    }

    #[test]
    fn test_pair_with_tight_capacity() {
        let model = test_utils::create_test_model(
            vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (10.0, 0.0), (11.0, 0.0)],
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![2, 2]),
                demands: Some(vec![0, 1, 1, 1, 1]),
                distance_capacity: Some(1_000),
                pickups_deliveries: vec![(1, 3)],
                ..TestModelOptions::default()
            },
        );

        let first = construct_solution(model, FirstSolutionStrategy::PathCheapestArc).unwrap();
        assert!(first.solution.is_complete());
        assert!(!first.fallback_used);
        assert_eq!(test_utils::route_nodes(&first.solution, 0), vec![1, 3]);
        assert_eq!(test_utils::route_nodes(&first.solution, 1), vec![2, 4]);
    }

    #[test]
    fn test_other_heuristics_are_tried_when_the_strategy_leaves_nodes_out() {
        let model = test_utils::create_test_model(
            vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (10.0, 0.0), (11.0, 0.0)],
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![3, 3]),
                demands: Some(vec![0, 1, 1, 2, 2]),
                ..TestModelOptions::default()
            },
        );

        // the two near stops share a vehicle and the far ones no longer fit
        let mut solution = WorkingSolution::new(model.clone());
        parallel_cheapest_insertion(&mut solution);
        assert_eq!(solution.unassigned_nodes().len(), 1);

        let first =
            construct_solution(model, FirstSolutionStrategy::ParallelCheapestInsertion).unwrap();
        assert!(first.solution.is_complete());
        assert!(first.fallback_used);
        assert_eq!(first.strategy, FirstSolutionStrategy::ParallelCheapestInsertion);
        assert_eq!(first.fallback_strategy, Some(FirstSolutionStrategy::Savings));
        assert_eq!(test_utils::route_nodes(&first.solution, 0), vec![1, 4]);
        assert_eq!(test_utils::route_nodes(&first.solution, 1), vec![2, 3]);
    }
}
