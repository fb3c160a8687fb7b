use crate::{
    model::routing_model::NodeRole,
    problem::node::NodeIdx,
    solver::solution::{
        route_change::RouteChange, route_id::RouteIdx, working_solution::WorkingSolution,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInsertion {
    pub route_id: RouteIdx,
    pub node: NodeIdx,
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairInsertion {
    pub route_id: RouteIdx,
    pub pickup: NodeIdx,
    pub delivery: NodeIdx,

    /// Position of the pickup
    pub pickup_position: usize,

    /// This is the position before the pickup has been inserted
    pub delivery_position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insertion {
    Node(NodeInsertion),
    Pair(PairInsertion),
}

impl Insertion {
    pub fn route_id(&self) -> RouteIdx {
        match self {
            Insertion::Node(ctx) => ctx.route_id,
            Insertion::Pair(ctx) => ctx.route_id,
        }
    }

    /// Node that identifies what gets inserted: the node itself or the pickup of a pair.
    pub fn node(&self) -> NodeIdx {
        match self {
            Insertion::Node(ctx) => ctx.node,
            Insertion::Pair(ctx) => ctx.pickup,
        }
    }

    pub fn route_change(&self, solution: &WorkingSolution) -> RouteChange {
        let route_id = self.route_id();
        let end = solution.route(route_id).end_position();

        match self {
            Insertion::Node(ctx) => RouteChange::new(route_id)
                .range(route_id, 0, ctx.position)
                .node(ctx.node)
                .range(route_id, ctx.position + 1, end),
            Insertion::Pair(ctx) => RouteChange::new(route_id)
                .range(route_id, 0, ctx.pickup_position)
                .node(ctx.pickup)
                .range(route_id, ctx.pickup_position + 1, ctx.delivery_position)
                .node(ctx.delivery)
                .range(route_id, ctx.delivery_position + 1, end),
        }
    }
}

/// Unit of insertion for an unassigned node: alone, or with its pair sibling.
///
/// Returns `None` for a delivery, which is always inserted together with its pickup.
pub fn insertion_unit(
    solution: &WorkingSolution,
    node: NodeIdx,
) -> Option<(NodeIdx, Option<NodeIdx>)> {
    match solution.model().node_role(node) {
        NodeRole::Regular => Some((node, None)),
        NodeRole::Pickup { delivery } => Some((node, Some(delivery))),
        NodeRole::Delivery { .. } => None,
    }
}

pub fn for_each_route_insertion(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    node: NodeIdx,
    mut f: impl FnMut(Insertion),
) {
    let route = solution.route(route_id);

    match insertion_unit(solution, node) {
        Some((node, None)) => {
            for position in 0..=route.len() {
                f(Insertion::Node(NodeInsertion {
                    route_id,
                    node,
                    position,
                }));
            }
        }
        Some((pickup, Some(delivery))) => {
            for pickup_position in 0..=route.len() {
                for delivery_position in pickup_position..=route.len() {
                    f(Insertion::Pair(PairInsertion {
                        route_id,
                        pickup,
                        delivery,
                        pickup_position,
                        delivery_position,
                    }));
                }
            }
        }
        None => {}
    }
}

pub fn for_each_insertion(solution: &WorkingSolution, node: NodeIdx, mut f: impl FnMut(Insertion)) {
    for route_id in solution.route_ids() {
        for_each_route_insertion(solution, route_id, node, &mut f);
    }
}
