use smallvec::SmallVec;

use crate::{problem::node::NodeIdx, solver::solution::route_id::RouteIdx};

/// Piece of a candidate route.
///
/// Ranges address the extended sequence of a route, `[depot, nodes..., depot]`, with
/// inclusive bounds. A reversed range is travelled from `end` down to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Range {
        route: RouteIdx,
        start: usize,
        end: usize,
        reversed: bool,
    },
    Node(NodeIdx),
}

/// New content of one route, described as a concatenation of segments.
#[derive(Debug, Clone)]
pub struct RouteChange {
    pub route: RouteIdx,
    pub segments: SmallVec<[Segment; 6]>,
}

impl RouteChange {
    pub fn new(route: RouteIdx) -> Self {
        RouteChange {
            route,
            segments: SmallVec::new(),
        }
    }

    /// Appends `route[start..=end]`. Empty ranges (`start > end`) are skipped.
    pub fn range(mut self, route: RouteIdx, start: usize, end: usize) -> Self {
        if start <= end {
            self.segments.push(Segment::Range {
                route,
                start,
                end,
                reversed: false,
            });
        }
        self
    }

    /// Appends `route[start..=end]` travelled backwards.
    pub fn reversed(mut self, route: RouteIdx, start: usize, end: usize) -> Self {
        if start <= end {
            self.segments.push(Segment::Range {
                route,
                start,
                end,
                reversed: true,
            });
        }
        self
    }

    pub fn node(mut self, node: NodeIdx) -> Self {
        self.segments.push(Segment::Node(node));
        self
    }
}

pub type RouteChanges = SmallVec<[RouteChange; 2]>;

/// Outcome of a feasible candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveEvaluation {
    /// Change of the objective: arc costs plus global span costs.
    pub cost_delta: i64,
    /// Arc cost part of `cost_delta`, local to the changed routes.
    pub arc_cost_delta: i64,
    /// Change of the accumulated guided local search penalties.
    pub penalty_delta: i64,
}

impl MoveEvaluation {
    pub fn augmented_delta(&self, lambda: i64) -> i64 {
        self.cost_delta + lambda * self.penalty_delta
    }
}
