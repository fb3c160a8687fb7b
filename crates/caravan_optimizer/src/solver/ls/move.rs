use smallvec::SmallVec;

use crate::{
    model::routing_model::RoutingModel,
    problem::node::NodeIdx,
    solver::{
        ls::{
            inter_relocate::InterRelocateOperator, inter_swap::InterSwapOperator,
            inter_two_opt_star::InterTwoOptStarOperator, or_opt::OrOptOperator,
            pair_relocate::PairRelocateOperator, relocate::RelocateOperator,
            swap::SwapOperator, two_opt::TwoOptOperator,
        },
        solution::{
            route_change::{MoveEvaluation, RouteChanges},
            route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

/// Nodes a move puts somewhere else, with the route they end up in.
pub type MovedNodes = SmallVec<[(NodeIdx, RouteIdx); 4]>;

pub trait LocalSearchOperator: Sized {
    /// Emits every move of this neighbourhood between two routes. Intra-route operators only
    /// act on `r1 == r2`.
    fn generate_moves<C>(
        model: &RoutingModel,
        solution: &WorkingSolution,
        pair: (RouteIdx, RouteIdx),
        consumer: C,
    ) where
        C: FnMut(Self);

    fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges;

    fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes;

    fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]>;

    fn evaluate(&self, solution: &WorkingSolution) -> Option<MoveEvaluation> {
        solution.evaluate(&self.route_changes(solution))
    }

    fn apply(&self, solution: &mut WorkingSolution) {
        let changes = self.route_changes(solution);
        solution.apply_changes(&changes);
    }
}

#[derive(Debug, Clone)]
pub enum LocalSearchMove {
    /// Moves one node elsewhere in its route.
    Relocate(RelocateOperator),
    /// Moves one node into another route.
    InterRelocate(InterRelocateOperator),
    /// Exchanges two nodes of a route.
    Swap(SwapOperator),
    /// Exchanges two nodes of different routes.
    InterSwap(InterSwapOperator),
    /// Reverses a segment of a route.
    TwoOpt(TwoOptOperator),
    /// Moves a chain of two or three nodes elsewhere in its route.
    OrOpt(OrOptOperator),
    /// Exchanges the tails of two routes.
    InterTwoOptStar(InterTwoOptStarOperator),
    /// Moves a pickup and its delivery together into another route.
    PairRelocate(PairRelocateOperator),
}

impl LocalSearchMove {
    pub fn operator_name(&self) -> &'static str {
        match self {
            LocalSearchMove::Relocate(_) => "Relocate",
            LocalSearchMove::InterRelocate(_) => "Inter-Relocate",
            LocalSearchMove::Swap(_) => "Swap",
            LocalSearchMove::InterSwap(_) => "Inter-Swap",
            LocalSearchMove::TwoOpt(_) => "Two-Opt",
            LocalSearchMove::OrOpt(_) => "Or-Opt",
            LocalSearchMove::InterTwoOptStar(_) => "Inter-2-Opt*",
            LocalSearchMove::PairRelocate(_) => "Pair-Relocate",
        }
    }

    pub fn route_changes(&self, solution: &WorkingSolution) -> RouteChanges {
        match self {
            LocalSearchMove::Relocate(op) => op.route_changes(solution),
            LocalSearchMove::InterRelocate(op) => op.route_changes(solution),
            LocalSearchMove::Swap(op) => op.route_changes(solution),
            LocalSearchMove::InterSwap(op) => op.route_changes(solution),
            LocalSearchMove::TwoOpt(op) => op.route_changes(solution),
            LocalSearchMove::OrOpt(op) => op.route_changes(solution),
            LocalSearchMove::InterTwoOptStar(op) => op.route_changes(solution),
            LocalSearchMove::PairRelocate(op) => op.route_changes(solution),
        }
    }

    pub fn moved_nodes(&self, solution: &WorkingSolution) -> MovedNodes {
        match self {
            LocalSearchMove::Relocate(op) => op.moved_nodes(solution),
            LocalSearchMove::InterRelocate(op) => op.moved_nodes(solution),
            LocalSearchMove::Swap(op) => op.moved_nodes(solution),
            LocalSearchMove::InterSwap(op) => op.moved_nodes(solution),
            LocalSearchMove::TwoOpt(op) => op.moved_nodes(solution),
            LocalSearchMove::OrOpt(op) => op.moved_nodes(solution),
            LocalSearchMove::InterTwoOptStar(op) => op.moved_nodes(solution),
            LocalSearchMove::PairRelocate(op) => op.moved_nodes(solution),
        }
    }

    pub fn updated_routes(&self) -> SmallVec<[RouteIdx; 2]> {
        match self {
            LocalSearchMove::Relocate(op) => op.updated_routes(),
            LocalSearchMove::InterRelocate(op) => op.updated_routes(),
            LocalSearchMove::Swap(op) => op.updated_routes(),
            LocalSearchMove::InterSwap(op) => op.updated_routes(),
            LocalSearchMove::TwoOpt(op) => op.updated_routes(),
            LocalSearchMove::OrOpt(op) => op.updated_routes(),
            LocalSearchMove::InterTwoOptStar(op) => op.updated_routes(),
            LocalSearchMove::PairRelocate(op) => op.updated_routes(),
        }
    }

    pub fn evaluate(&self, solution: &WorkingSolution) -> Option<MoveEvaluation> {
        solution.evaluate(&self.route_changes(solution))
    }

    pub fn apply(&self, solution: &mut WorkingSolution) {
        let changes = self.route_changes(solution);
        solution.apply_changes(&changes);
    }
}

/// Calls `f` with every move of every operator for a route pair.
pub fn for_each_move(
    model: &RoutingModel,
    solution: &WorkingSolution,
    pair: (RouteIdx, RouteIdx),
    mut f: impl FnMut(LocalSearchMove),
) {
    RelocateOperator::generate_moves(model, solution, pair, |op| {
        f(LocalSearchMove::Relocate(op))
    });
    SwapOperator::generate_moves(model, solution, pair, |op| f(LocalSearchMove::Swap(op)));
    TwoOptOperator::generate_moves(model, solution, pair, |op| f(LocalSearchMove::TwoOpt(op)));
    OrOptOperator::generate_moves(model, solution, pair, |op| f(LocalSearchMove::OrOpt(op)));
    InterRelocateOperator::generate_moves(model, solution, pair, |op| {
        f(LocalSearchMove::InterRelocate(op))
    });
    InterSwapOperator::generate_moves(model, solution, pair, |op| {
        f(LocalSearchMove::InterSwap(op))
    });
    InterTwoOptStarOperator::generate_moves(model, solution, pair, |op| {
        f(LocalSearchMove::InterTwoOptStar(op))
    });
    PairRelocateOperator::generate_moves(model, solution, pair, |op| {
        f(LocalSearchMove::PairRelocate(op))
    });
}
