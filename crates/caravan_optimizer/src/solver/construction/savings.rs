use tracing::debug;

use crate::{
    model::routing_model::{NodeRole, RoutingModel},
    problem::node::NodeIdx,
    solver::{
        construction::cheapest_insertion::parallel_cheapest_insertion,
        solution::{route_change::RouteChange, working_solution::WorkingSolution},
    },
};

struct Chain {
    nodes: Vec<NodeIdx>,
    /// Dimension totals of `depot -> nodes -> depot`.
    totals: Vec<i64>,
}

/// Largest capacity of each dimension over the fleet.
fn max_capacities(model: &RoutingModel) -> Vec<i64> {
    model
        .dimensions()
        .iter()
        .map(|dimension| {
            dimension
                .vehicle_capacities()
                .iter()
                .copied()
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn chain_totals(model: &RoutingModel, nodes: &[NodeIdx]) -> Vec<i64> {
    let depot = model.depot();
    let sequence = std::iter::once(depot)
        .chain(nodes.iter().copied())
        .chain(std::iter::once(depot))
        .collect::<Vec<_>>();

    (0..model.dimensions().len())
        .map(|dimension| {
            sequence
                .windows(2)
                .map(|arc| model.metric(dimension + 1, arc[0], arc[1]))
                .sum()
        })
        .collect()
}

/// Totals of `a` followed by `b`, joined on the arc `last(a) -> first(b)`.
fn merged_totals(model: &RoutingModel, a: &Chain, b: &Chain) -> Vec<i64> {
    let depot = model.depot();
    let (Some(&last), Some(&first)) = (a.nodes.last(), b.nodes.first()) else {
        return a.totals.iter().zip(&b.totals).map(|(x, y)| x + y).collect();
    };

    a.totals
        .iter()
        .zip(&b.totals)
        .enumerate()
        .map(|(dimension, (x, y))| {
            let metric = dimension + 1;
            x + y - model.metric(metric, last, depot) - model.metric(metric, depot, first)
                + model.metric(metric, last, first)
        })
        .collect()
}

/// Initial chains: every pair on its own as `[pickup, delivery]`, every other stop alone.
fn initial_chains(model: &RoutingModel) -> Vec<Chain> {
    model
        .data()
        .stops()
        .filter_map(|node| match model.node_role(node) {
            NodeRole::Regular => Some(vec![node]),
            NodeRole::Pickup { delivery } => Some(vec![node, delivery]),
            NodeRole::Delivery { .. } => None,
        })
        .map(|nodes| Chain {
            totals: chain_totals(model, &nodes),
            nodes,
        })
        .collect()
}

/// Clarke and Wright savings: chains are merged end to start by decreasing
/// `c(i, depot) + c(depot, j) - c(i, j)` while every dimension fits in the largest vehicle,
/// then placed on vehicles. Whatever does not fit is inserted afterwards.
pub fn savings(solution: &mut WorkingSolution) {
    let model = solution.model_arc().clone();
    let depot = model.depot();
    let capacities = max_capacities(&model);

    let mut chains = initial_chains(&model)
        .into_iter()
        .map(Some)
        .collect::<Vec<_>>();

    // chain owning a node when it is its first or last node
    let mut head_of = vec![None; model.num_nodes()];
    let mut tail_of = vec![None; model.num_nodes()];
    for (index, chain) in chains.iter().enumerate() {
        if let Some(chain) = chain {
            head_of[chain.nodes[0].get()] = Some(index);
            tail_of[chain.nodes[chain.nodes.len() - 1].get()] = Some(index);
        }
    }

    let ends = chains
        .iter()
        .flatten()
        .flat_map(|chain| [chain.nodes[0], chain.nodes[chain.nodes.len() - 1]])
        .collect::<Vec<_>>();

    let mut savings = Vec::new();
    for &i in &ends {
        for &j in &ends {
            if i == j {
                continue;
            }
            let saving = model.arc_cost(i, depot) + model.arc_cost(depot, j) - model.arc_cost(i, j);
            if saving > 0 {
                savings.push((saving, i, j));
            }
        }
    }
    savings.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut merges = 0;
    for (_, i, j) in savings {
        let (Some(a), Some(b)) = (tail_of[i.get()], head_of[j.get()]) else {
            continue;
        };
        if a == b {
            continue;
        }
        let (Some(chain_a), Some(chain_b)) = (&chains[a], &chains[b]) else {
            continue;
        };

        let totals = merged_totals(&model, chain_a, chain_b);
        if totals
            .iter()
            .zip(&capacities)
            .any(|(total, capacity)| total > capacity)
        {
            continue;
        }

        let Some(chain_b) = chains[b].take() else {
            continue;
        };
        let Some(chain_a) = chains[a].as_mut() else {
            continue;
        };

        tail_of[i.get()] = None;
        head_of[j.get()] = None;
        if let Some(&last) = chain_b.nodes.last() {
            tail_of[last.get()] = Some(a);
        }
        chain_a.nodes.extend(chain_b.nodes);
        chain_a.totals = totals;
        merges += 1;
    }

    let mut chains = chains.into_iter().flatten().collect::<Vec<_>>();
    chains.sort_by(|a, b| b.nodes.len().cmp(&a.nodes.len()).then(a.nodes[0].cmp(&b.nodes[0])));

    debug!(merges, chains = chains.len(), "Savings merged chains");

    for chain in &chains {
        let mut best: Option<(i64, RouteChange)> = None;

        for route_id in solution.route_ids() {
            let route = solution.route(route_id);
            let end = route.end_position();
            let mut change = RouteChange::new(route_id).range(route_id, 0, route.len());
            for &node in &chain.nodes {
                change = change.node(node);
            }
            let change = change.range(route_id, end, end);

            if let Some(evaluation) = solution.evaluate(std::slice::from_ref(&change))
                && best
                    .as_ref()
                    .is_none_or(|(best_delta, _)| evaluation.cost_delta < *best_delta)
            {
                best = Some((evaluation.cost_delta, change));
            }
        }

        if let Some((_, change)) = best {
            solution.apply_changes(&[change]);
        }
    }

    if !solution.is_complete() {
        parallel_cheapest_insertion(solution);
    }
}
