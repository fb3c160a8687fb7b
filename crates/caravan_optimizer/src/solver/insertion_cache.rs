use fxhash::FxHashMap;

use crate::{
    problem::node::NodeIdx,
    solver::{
        insertion::{Insertion, for_each_route_insertion},
        solution::{
            route::WorkingSolutionRoute, route_change::MoveEvaluation, route_id::RouteIdx,
            working_solution::WorkingSolution,
        },
    },
};

#[derive(Clone, Debug)]
pub struct ScoredInsertion {
    pub insertion: Insertion,
    pub evaluation: MoveEvaluation,
}

/// Cheapest feasible insertion of a node into a route.
///
/// Positions are compared on arc cost, which only depends on the route itself.
pub fn best_route_insertion(
    solution: &WorkingSolution,
    route_id: RouteIdx,
    node: NodeIdx,
) -> Option<ScoredInsertion> {
    let mut best: Option<ScoredInsertion> = None;

    for_each_route_insertion(solution, route_id, node, |insertion| {
        let change = insertion.route_change(solution);
        if let Some(evaluation) = solution.evaluate(std::slice::from_ref(&change))
            && best
                .as_ref()
                .is_none_or(|best| evaluation.arc_cost_delta < best.evaluation.arc_cost_delta)
        {
            best = Some(ScoredInsertion {
                insertion,
                evaluation,
            });
        }
    });

    best
}

/// Best insertions per route, valid as long as the route keeps the same version.
pub struct InsertionCache {
    cache: FxHashMap<(RouteIdx, usize, NodeIdx), Option<ScoredInsertion>>,
}

impl InsertionCache {
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
        }
    }

    /// Cheapest insertion of `node` into the route with the objective change it causes now.
    ///
    /// The position comes from the cache when the route did not change, the global span part
    /// of the evaluation is always recomputed against the current solution.
    pub fn best_insertion(
        &mut self,
        solution: &WorkingSolution,
        route_id: RouteIdx,
        node: NodeIdx,
    ) -> Option<ScoredInsertion> {
        let version = solution.route(route_id).version();
        let cached = self
            .cache
            .entry((route_id, version, node))
            .or_insert_with(|| best_route_insertion(solution, route_id, node));

        let insertion = cached.as_ref()?.insertion.clone();
        let change = insertion.route_change(solution);
        let evaluation = solution.evaluate(std::slice::from_ref(&change))?;

        Some(ScoredInsertion {
            insertion,
            evaluation,
        })
    }

    pub fn clear(&mut self, routes: &[WorkingSolutionRoute]) {
        self.cache.retain(|(route_idx, version, _), _| {
            if let Some(route) = routes.get(route_idx.get()) {
                *version == route.version()
            } else {
                false
            }
        });
    }
}

impl Default for InsertionCache {
    fn default() -> Self {
        Self::new()
    }
}
