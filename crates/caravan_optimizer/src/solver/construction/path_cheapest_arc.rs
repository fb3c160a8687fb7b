use std::cmp::Ordering;

use crate::{
    model::routing_model::{NodeRole, RoutingModel},
    problem::node::NodeIdx,
    solver::solution::{
        route_change::RouteChange, route_id::RouteIdx, working_solution::WorkingSolution,
    },
};

/// How the next arc is picked among the feasible extensions of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcSelection {
    /// Cheapest arc from the end of the route.
    Cheapest,
    /// Paired and tight nodes first, then the cheapest arc.
    MostConstrained,
    /// Lowest node index.
    FirstUnbound,
}

#[derive(Debug, Clone, Copy)]
struct ArcCandidate {
    node: NodeIdx,
    arc_cost: i64,
}

/// Deliveries still owed by a route, in the order of their pickups.
fn pending_deliveries(solution: &WorkingSolution, route_id: RouteIdx) -> Vec<NodeIdx> {
    let model = solution.model();

    solution
        .route(route_id)
        .nodes()
        .iter()
        .filter_map(|&node| match model.node_role(node) {
            NodeRole::Pickup { delivery } if solution.position_of(delivery).is_none() => {
                Some(delivery)
            }
            _ => None,
        })
        .collect()
}

/// Route extended with `tail`, closed back at the depot.
fn extension(solution: &WorkingSolution, route_id: RouteIdx, tail: &[NodeIdx]) -> RouteChange {
    let route = solution.route(route_id);
    let end = route.end_position();

    let mut change = RouteChange::new(route_id).range(route_id, 0, route.len());
    for &node in tail {
        change = change.node(node);
    }
    change.range(route_id, end, end)
}

/// Whether `node` may be appended to the route: regular nodes and pickups when unassigned,
/// deliveries only behind their pickup.
fn is_candidate(solution: &WorkingSolution, route_id: RouteIdx, node: NodeIdx) -> bool {
    match solution.model().node_role(node) {
        NodeRole::Regular | NodeRole::Pickup { .. } => true,
        NodeRole::Delivery { pickup } => solution
            .position_of(pickup)
            .is_some_and(|(pickup_route, _)| pickup_route == route_id),
    }
}

/// Appending a candidate must leave room for every delivery the route still owes.
fn feasible_candidates(solution: &WorkingSolution, route_id: RouteIdx) -> Vec<ArcCandidate> {
    let model = solution.model();
    let route = solution.route(route_id);
    let last = route.ext_node(route.len());
    let pending = pending_deliveries(solution, route_id);

    let mut tail = Vec::with_capacity(pending.len() + 2);
    let mut candidates = Vec::new();

    for node in solution.sorted_unassigned_nodes() {
        if !is_candidate(solution, route_id, node) {
            continue;
        }

        tail.clear();
        tail.push(node);
        tail.extend(pending.iter().copied().filter(|&delivery| delivery != node));
        if let NodeRole::Pickup { delivery } = model.node_role(node) {
            tail.push(delivery);
        }

        let extended = extension(solution, route_id, &tail);
        if solution.evaluate(&[extended]).is_some() {
            candidates.push(ArcCandidate {
                node,
                arc_cost: model.arc_cost(last, node),
            });
        }
    }

    candidates
}

/// Largest share of a vehicle capacity the node needs to be reached, over all dimensions.
fn tightness(model: &RoutingModel, node: NodeIdx) -> f64 {
    model
        .dimensions()
        .iter()
        .map(|dimension| {
            let capacity = dimension
                .vehicle_capacities()
                .iter()
                .copied()
                .max()
                .unwrap_or(0);
            if capacity == 0 {
                0.0
            } else {
                dimension.transits().min_incoming(node) as f64 / capacity as f64
            }
        })
        .fold(0.0, f64::max)
}

fn compare_candidates(
    model: &RoutingModel,
    selection: ArcSelection,
    a: &ArcCandidate,
    b: &ArcCandidate,
) -> Ordering {
    match selection {
        ArcSelection::Cheapest => a.arc_cost.cmp(&b.arc_cost).then(a.node.cmp(&b.node)),
        ArcSelection::MostConstrained => {
            let a_paired = model.node_role(a.node).is_paired();
            let b_paired = model.node_role(b.node).is_paired();

            b_paired
                .cmp(&a_paired)
                .then_with(|| tightness(model, b.node).total_cmp(&tightness(model, a.node)))
                .then(a.arc_cost.cmp(&b.arc_cost))
                .then(a.node.cmp(&b.node))
        }
        ArcSelection::FirstUnbound => a.node.cmp(&b.node),
    }
}

fn select(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    selection: ArcSelection,
) -> Option<ArcCandidate> {
    let model = solution.model();
    feasible_candidates(solution, route_id)
        .into_iter()
        .min_by(|a, b| compare_candidates(model, selection, a, b))
}

fn append(solution: &mut WorkingSolution, route_id: RouteIdx, node: NodeIdx) {
    let change = extension(solution, route_id, &[node]);
    solution.apply_changes(&[change]);
}

/// Appends the owed deliveries. Pickups whose delivery cannot follow are taken out again.
fn close(solution: &mut WorkingSolution, route_id: RouteIdx) {
    let pending = pending_deliveries(solution, route_id);
    if pending.is_empty() {
        return;
    }

    let change = extension(solution, route_id, &pending);
    if solution.evaluate(std::slice::from_ref(&change)).is_some() {
        solution.apply_changes(&[change]);
        return;
    }

    let model = solution.model_arc().clone();
    for delivery in pending {
        if let NodeRole::Delivery { pickup } = model.node_role(delivery) {
            solution.remove(pickup);
        }
    }
}

/// Builds routes one vehicle after the other, each extended until no node fits.
pub fn sequential_arc_construction(solution: &mut WorkingSolution, selection: ArcSelection) {
    for route_id in solution.route_ids() {
        while let Some(candidate) = select(solution, route_id, selection) {
            append(solution, route_id, candidate.node);
        }
        close(solution, route_id);
    }
}

pub fn path_cheapest_arc(solution: &mut WorkingSolution) {
    sequential_arc_construction(solution, ArcSelection::Cheapest);
}

pub fn path_most_constrained_arc(solution: &mut WorkingSolution) {
    sequential_arc_construction(solution, ArcSelection::MostConstrained);
}

pub fn first_unbound_min_value(solution: &mut WorkingSolution) {
    sequential_arc_construction(solution, ArcSelection::FirstUnbound);
}

/// Vehicles take turns: each one extends its route by its cheapest arc.
pub fn local_cheapest_arc(solution: &mut WorkingSolution) {
    let mut open = solution.route_ids().collect::<Vec<_>>();

    while !open.is_empty() {
        open.retain(|&route_id| match select(solution, route_id, ArcSelection::Cheapest) {
            Some(candidate) => {
                append(solution, route_id, candidate.node);
                true
            }
            None => {
                close(solution, route_id);
                false
            }
        });
    }
}

/// Always extends the route owning the globally cheapest arc.
pub fn global_cheapest_arc(solution: &mut WorkingSolution) {
    let mut open = solution.route_ids().collect::<Vec<_>>();

    loop {
        let mut best: Option<(RouteIdx, ArcCandidate)> = None;

        open.retain(|&route_id| match select(solution, route_id, ArcSelection::Cheapest) {
            Some(candidate) => {
                if best
                    .as_ref()
                    .is_none_or(|(_, best)| candidate.arc_cost < best.arc_cost)
                {
                    best = Some((route_id, candidate));
                }
                true
            }
            None => {
                close(solution, route_id);
                false
            }
        });

        match best {
            Some((route_id, candidate)) => append(solution, route_id, candidate.node),
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

    #[test]
    fn test_path_cheapest_arc_follows_nearest_neighbour() {
        let model = test_utils::create_line_model(5, 1, TestModelOptions::default());
        let mut solution = WorkingSolution::new(model);

        path_cheapest_arc(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2, 3, 4]);
        assert_eq!(solution.objective(), 8);
    }

    #[test]
    fn test_first_unbound_min_value_uses_node_order() {
        let model = test_utils::create_test_model(
            vec![(0.0, 0.0), (5.0, 0.0), (1.0, 0.0), (3.0, 0.0)],
            1,
            TestModelOptions::default(),
        );
        let mut solution = WorkingSolution::new(model);

        first_unbound_min_value(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_arc_strategies_respect_capacity_and_pairs() {
        let options = TestModelOptions {
            vehicle_capacities: Some(vec![4, 4, 4]),
            demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 1]),
            distance_capacity: Some(10_000),
            pickups_deliveries: vec![(8, 1), (3, 5)],
            ..TestModelOptions::default()
        };
        let model = test_utils::create_grid_model(3, 3, 3, options);

        let strategies: [fn(&mut WorkingSolution); 5] = [
            path_cheapest_arc,
            path_most_constrained_arc,
            first_unbound_min_value,
            local_cheapest_arc,
            global_cheapest_arc,
        ];

        for strategy in strategies {
            let mut solution = WorkingSolution::new(model.clone());
            strategy(&mut solution);

            let (score, _) = compute_solution_score(&default_constraints(), &solution);
            assert!(solution.is_complete());
            assert_eq!(score.hard_score, 0);
        }
    }

    #[test]
    fn test_route_is_closed_when_capacity_is_reached() {
        let model = test_utils::create_line_model(
            5,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![2, 2]),
                demands: Some(vec![0, 1, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );
        let mut solution = WorkingSolution::new(model);

        path_cheapest_arc(&mut solution);

        assert_eq!(test_utils::route_nodes(&solution, 0), vec![1, 2]);
        assert_eq!(test_utils::route_nodes(&solution, 1), vec![3, 4]);
    }
}
