use crate::{
    problem::node::NodeIdx,
    solver::{
        insertion::{Insertion, for_each_route_insertion, insertion_unit},
        insertion_cache::{InsertionCache, ScoredInsertion},
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// Unassigned nodes that can be inserted on their own: regular nodes and pickups.
fn insertion_units(solution: &WorkingSolution) -> Vec<NodeIdx> {
    solution
        .sorted_unassigned_nodes()
        .into_iter()
        .filter(|&node| insertion_unit(solution, node).is_some())
        .collect()
}

/// Cheapest insertion of a node over all routes, on the full objective change.
fn best_insertion_for_node(
    solution: &WorkingSolution,
    cache: &mut InsertionCache,
    node: NodeIdx,
) -> Option<ScoredInsertion> {
    let mut best: Option<ScoredInsertion> = None;

    for route_id in solution.route_ids() {
        if let Some(candidate) = cache.best_insertion(solution, route_id, node)
            && best
                .as_ref()
                .is_none_or(|best| candidate.evaluation.cost_delta < best.evaluation.cost_delta)
        {
            best = Some(candidate);
        }
    }

    best
}

fn insert(solution: &mut WorkingSolution, cache: &mut InsertionCache, insertion: &Insertion) {
    solution.insert(insertion);
    cache.clear(solution.routes());
}

/// Repeatedly inserts the globally cheapest (node, route, position) until nothing fits.
pub fn parallel_cheapest_insertion(solution: &mut WorkingSolution) {
    let mut cache = InsertionCache::new();

    loop {
        let mut best: Option<ScoredInsertion> = None;

        for node in insertion_units(solution) {
            if let Some(candidate) = best_insertion_for_node(solution, &mut cache, node)
                && best
                    .as_ref()
                    .is_none_or(|best| candidate.evaluation.cost_delta < best.evaluation.cost_delta)
            {
                best = Some(candidate);
            }
        }

        match best {
            Some(best) => insert(solution, &mut cache, &best.insertion),
            None => break,
        }
    }
}

/// Fills one vehicle at a time with its cheapest insertion before opening the next one.
pub fn sequential_cheapest_insertion(solution: &mut WorkingSolution) {
    let mut cache = InsertionCache::new();

    for route_id in solution.route_ids() {
        loop {
            let mut best: Option<ScoredInsertion> = None;

            for node in insertion_units(solution) {
                if let Some(candidate) = cache.best_insertion(solution, route_id, node)
                    && best.as_ref().is_none_or(|best| {
                        candidate.evaluation.cost_delta < best.evaluation.cost_delta
                    })
                {
                    best = Some(candidate);
                }
            }

            match best {
                Some(best) => insert(solution, &mut cache, &best.insertion),
                None => break,
            }
        }
    }
}

/// Takes nodes in index order and inserts each one where the arc cost grows the least.
pub fn local_cheapest_insertion(solution: &mut WorkingSolution) {
    let mut cache = InsertionCache::new();

    for node in insertion_units(solution) {
        let mut best: Option<ScoredInsertion> = None;

        for route_id in solution.route_ids() {
            if let Some(candidate) = cache.best_insertion(solution, route_id, node)
                && best.as_ref().is_none_or(|best| {
                    candidate.evaluation.arc_cost_delta < best.evaluation.arc_cost_delta
                })
            {
                best = Some(candidate);
            }
        }

        if let Some(best) = best {
            insert(solution, &mut cache, &best.insertion);
        }
    }
}

/// Same node order as [`local_cheapest_insertion`], but every position of every route is
/// ranked on the full objective change, span costs included.
pub fn local_cheapest_cost_insertion(solution: &mut WorkingSolution) {
    for node in insertion_units(solution) {
        let mut best: Option<ScoredInsertion> = None;

        for route_id in solution.route_ids() {
            for_each_route_insertion(solution, route_id, node, |insertion| {
                let change = insertion.route_change(solution);
                if let Some(evaluation) = solution.evaluate(std::slice::from_ref(&change))
                    && best
                        .as_ref()
                        .is_none_or(|best| evaluation.cost_delta < best.evaluation.cost_delta)
                {
                    best = Some(ScoredInsertion {
                        insertion,
                        evaluation,
                    });
                }
            });
        }

        if let Some(best) = best {
            solution.insert(&best.insertion);
        }
    }
}

/// Regret insertion: the node losing the most when not inserted in its best route goes first.
pub fn best_insertion(solution: &mut WorkingSolution) {
    let mut cache = InsertionCache::new();

    loop {
        // (regret, best cost, insertion)
        let mut selected: Option<(i64, i64, Insertion)> = None;

        for node in insertion_units(solution) {
            let mut costs: Vec<(i64, RouteIdx)> = Vec::new();
            let mut best_for_node: Option<ScoredInsertion> = None;

            for route_id in solution.route_ids() {
                if let Some(candidate) = cache.best_insertion(solution, route_id, node) {
                    costs.push((candidate.evaluation.cost_delta, route_id));
                    if best_for_node.as_ref().is_none_or(|best| {
                        candidate.evaluation.cost_delta < best.evaluation.cost_delta
                    }) {
                        best_for_node = Some(candidate);
                    }
                }
            }

            let Some(best_for_node) = best_for_node else {
                continue;
            };

            costs.sort_unstable();
            let best_cost = costs[0].0;
            let regret = costs
                .get(1)
                .map_or(i64::MAX, |(second, _)| second - best_cost);

            let is_better = selected.as_ref().is_none_or(|(selected_regret, selected_cost, _)| {
                regret > *selected_regret
                    || (regret == *selected_regret && best_cost < *selected_cost)
            });

            if is_better {
                selected = Some((regret, best_cost, best_for_node.insertion));
            }
        }

        match selected {
            Some((_, _, insertion)) => insert(solution, &mut cache, &insertion),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::constraints::constraint::{compute_solution_score, default_constraints},
        test_utils::{self, TestModelOptions},
    };

    fn assert_complete_and_feasible(solution: &WorkingSolution) {
        let (score, _) = compute_solution_score(&default_constraints(), solution);
        assert!(solution.is_complete());
        assert_eq!(score.hard_score, 0);
    }

    #[test]
    fn test_parallel_cheapest_insertion_on_line() {
        let model = test_utils::create_line_model(6, 1, TestModelOptions::default());
        let mut solution = WorkingSolution::new(model);

        parallel_cheapest_insertion(&mut solution);

        assert_complete_and_feasible(&solution);
        assert_eq!(solution.objective(), 10);
    }

    #[test]
    fn test_insertions_respect_capacity() {
        let options = TestModelOptions {
            vehicle_capacities: Some(vec![3, 3]),
            demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1]),
            ..TestModelOptions::default()
        };

        let strategies: [fn(&mut WorkingSolution); 5] = [
            parallel_cheapest_insertion,
            sequential_cheapest_insertion,
            local_cheapest_insertion,
            local_cheapest_cost_insertion,
            best_insertion,
        ];

        for strategy in strategies {
            let model = test_utils::create_grid_model(2, 4, 2, options.clone());
            let mut solution = WorkingSolution::new(model);
            strategy(&mut solution);

            // 7 stops do not fit in 2 x 3
            assert_eq!(solution.unassigned_nodes().len(), 1);
            assert!(solution.routes().iter().all(|route| route.len() == 3));
        }
    }

    #[test]
    fn test_insertions_keep_pairs_together() {
        let model = test_utils::create_grid_model(
            3,
            3,
            2,
            TestModelOptions {
                distance_capacity: Some(10_000),
                pickups_deliveries: vec![(8, 1), (2, 6)],
                ..TestModelOptions::default()
            },
        );

        let strategies: [fn(&mut WorkingSolution); 5] = [
            parallel_cheapest_insertion,
            sequential_cheapest_insertion,
            local_cheapest_insertion,
            local_cheapest_cost_insertion,
            best_insertion,
        ];

        for strategy in strategies {
            let mut solution = WorkingSolution::new(model.clone());
            strategy(&mut solution);
            assert_complete_and_feasible(&solution);
        }
    }

    #[test]
    fn test_local_cheapest_cost_insertion_balances_span() {
        // arc cost alone puts both stops on one vehicle, the span cost splits them
        let model = test_utils::create_test_model(
            vec![(0.0, 0.0), (0.0, 10.0), (0.0, -10.0)],
            2,
            TestModelOptions {
                distance_capacity: Some(1_000),
                span_coefficient: 100,
                ..TestModelOptions::default()
            },
        );

        let mut by_arc_cost = WorkingSolution::new(model.clone());
        local_cheapest_insertion(&mut by_arc_cost);
        assert_complete_and_feasible(&by_arc_cost);

        let mut by_objective = WorkingSolution::new(model);
        local_cheapest_cost_insertion(&mut by_objective);
        assert_complete_and_feasible(&by_objective);

        assert_eq!(test_utils::route_nodes(&by_objective, 0), vec![1]);
        assert_eq!(test_utils::route_nodes(&by_objective, 1), vec![2]);
        assert!(by_objective.objective() <= by_arc_cost.objective());
    }
}
