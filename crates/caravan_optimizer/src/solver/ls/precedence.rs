//! Pickup before delivery checks for moves that reorder a single route.

use std::ops::Range;

use crate::{
    model::routing_model::NodeRole,
    problem::node::NodeIdx,
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
};

/// Position of the other node of the pair, when it is in the same route.
#[inline]
pub fn sibling_position(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    node: NodeIdx,
) -> Option<usize> {
    let sibling = solution.model().node_role(node).sibling()?;
    match solution.position_of(sibling) {
        Some((route, position)) if route == route_id => Some(position),
        _ => None,
    }
}

/// Moving `start..=end` in front of the node currently at `to`.
///
/// The segment jumps over the nodes between its old and new place. A pickup may not jump
/// forward over its delivery, a delivery may not jump backward over its pickup.
pub fn segment_move_keeps_precedence(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    start: usize,
    end: usize,
    to: usize,
) -> bool {
    let route = solution.route(route_id);
    let model = solution.model();

    let (crossed, forward): (Range<usize>, bool) = if to > end {
        (end + 1..to, true)
    } else {
        (to..start, false)
    };

    route.nodes()[start..=end].iter().all(|&node| {
        let role = model.node_role(node);
        let jumps_sibling = match role {
            NodeRole::Pickup { .. } if forward => true,
            NodeRole::Delivery { .. } if !forward => true,
            _ => false,
        };

        !jumps_sibling
            || sibling_position(solution, route_id, node)
                .is_none_or(|position| !crossed.contains(&position))
    })
}

/// Reversing `start..=end` is only allowed when no pair lies entirely inside the segment.
pub fn reversal_keeps_precedence(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    start: usize,
    end: usize,
) -> bool {
    let route = solution.route(route_id);

    route.nodes()[start..=end].iter().all(|&node| {
        sibling_position(solution, route_id, node)
            .is_none_or(|position| position < start || position > end)
    })
}
