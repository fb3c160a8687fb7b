use fxhash::{FxBuildHasher, FxHashMap, FxHashSet};
use rand::{Rng, rngs::SmallRng};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{Level, debug, instrument};

use crate::{
    model::routing_model::RoutingModel,
    solver::{
        ls::r#move::{LocalSearchMove, for_each_move},
        solution::{
            route_change::MoveEvaluation, route_id::RouteIdx, working_solution::WorkingSolution,
        },
    },
};

type RoutePair = (RouteIdx, RouteIdx);
type VersionPair = (usize, usize);

/// Attempts made by [`LocalSearch::random_move`] before giving up.
const RANDOM_MOVE_ATTEMPTS: usize = 16;

/// Move applied by a local search step.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub operator_name: &'static str,
    pub evaluation: MoveEvaluation,
    pub score: i64,
}

/// Best-improvement local search over every route pair.
///
/// The best move of each route pair is computed in parallel and cached by the versions of
/// both routes. Only pairs touching a route changed by the last move are searched again.
pub struct LocalSearch {
    pairs: Vec<RoutePair>,
    state: LocalSearchState,
}

impl LocalSearch {
    pub fn new(model: &RoutingModel) -> Self {
        let count = model.num_vehicles();

        LocalSearch {
            pairs: Vec::with_capacity(count * count),
            state: LocalSearchState::new(),
        }
    }

    /// Applies the move with the lowest negative `score`, if any.
    ///
    /// Cached moves are re-evaluated before use: global span costs depend on every route,
    /// so a cached evaluation may be out of date even when both routes are not.
    #[instrument(skip_all, level = Level::TRACE)]
    pub fn improve<S>(&mut self, solution: &mut WorkingSolution, score: &S) -> Option<AppliedMove>
    where
        S: Fn(&MoveEvaluation) -> i64 + Sync,
    {
        let searched_all = self.search_pairs(solution, score);

        if let Some(applied) = self.apply_best(solution, score) {
            return Some(applied);
        }

        if searched_all || !solution.model().has_global_span_costs() {
            return None;
        }

        // cached pairs may hide a move that became improving through the span costs
        debug!("Local Search: no improving cached move, searching every route pair again");
        self.state.clear();
        self.search_pairs(solution, score);
        self.apply_best(solution, score)
    }

    /// Best move over the whole neighbourhood accepted by `filter`, improving or not.
    pub fn best_move<S, F>(
        &self,
        solution: &WorkingSolution,
        score: &S,
        filter: &F,
    ) -> Option<(LocalSearchMove, MoveEvaluation, i64)>
    where
        S: Fn(&MoveEvaluation) -> i64 + Sync,
        F: Fn(&LocalSearchMove, &MoveEvaluation) -> bool + Sync,
    {
        let pairs = all_pairs(solution);
        let model = solution.model();

        pairs
            .par_iter()
            .filter_map(|&pair| {
                let mut best: Option<(LocalSearchMove, MoveEvaluation, i64)> = None;

                for_each_move(model, solution, pair, |op| {
                    let Some(evaluation) = op.evaluate(solution) else {
                        return;
                    };
                    let value = score(&evaluation);
                    if best.as_ref().is_none_or(|(_, _, best)| value < *best)
                        && filter(&op, &evaluation)
                    {
                        best = Some((op, evaluation, value));
                    }
                });

                best
            })
            .collect::<Vec<_>>()
            .into_iter()
            .reduce(|best, candidate| if candidate.2 < best.2 { candidate } else { best })
    }

    /// A feasible move drawn uniformly from the neighbourhood of a random route pair.
    pub fn random_move(
        &self,
        solution: &WorkingSolution,
        rng: &mut SmallRng,
    ) -> Option<(LocalSearchMove, MoveEvaluation)> {
        let num_routes = solution.routes().len();
        let model = solution.model();

        for _ in 0..RANDOM_MOVE_ATTEMPTS {
            let pair = (
                RouteIdx::new(rng.random_range(0..num_routes)),
                RouteIdx::new(rng.random_range(0..num_routes)),
            );

            let mut seen = 0_usize;
            let mut selected = None;
            for_each_move(model, solution, pair, |op| {
                seen += 1;
                if rng.random_range(0..seen) == 0 {
                    selected = Some(op);
                }
            });

            if let Some(op) = selected
                && let Some(evaluation) = op.evaluate(solution)
            {
                return Some((op, evaluation));
            }
        }

        None
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// Searches the pairs missing from the cache. Returns whether every pair was searched.
    fn search_pairs<S>(&mut self, solution: &WorkingSolution, score: &S) -> bool
    where
        S: Fn(&MoveEvaluation) -> i64 + Sync,
    {
        self.build_pairs(solution);
        let searched_all = self.pairs.len() == solution.routes().len().pow(2);
        let model = solution.model();

        let results = self
            .pairs
            .par_iter()
            .map(|&(r1, r2)| {
                let mut best_score = 0;
                let mut best_move: Option<LocalSearchMove> = None;

                for_each_move(model, solution, (r1, r2), |op| {
                    if let Some(evaluation) = op.evaluate(solution) {
                        let value = score(&evaluation);
                        if value < best_score {
                            best_score = value;
                            best_move = Some(op);
                        }
                    }
                });

                (r1, r2, best_move)
            })
            .collect::<Vec<_>>();

        for (r1, r2, best_move) in results {
            self.state.update_best(solution, r1, r2, best_move);
        }

        searched_all
    }

    fn apply_best<S>(&mut self, solution: &mut WorkingSolution, score: &S) -> Option<AppliedMove>
    where
        S: Fn(&MoveEvaluation) -> i64 + Sync,
    {
        let mut best: Option<(i64, MoveEvaluation, &LocalSearchMove)> = None;

        for r1 in solution.route_ids() {
            for r2 in solution.route_ids() {
                let Some(op) = self.state.best_move(solution, r1, r2) else {
                    continue;
                };
                let Some(evaluation) = op.evaluate(solution) else {
                    continue;
                };

                let value = score(&evaluation);
                if value < 0 && best.as_ref().is_none_or(|(best, _, _)| value < *best) {
                    best = Some((value, evaluation, op));
                }
            }
        }

        let (value, evaluation, op) = best?;
        let op = op.clone();

        debug!(
            "Apply {} (d={}) {:?}",
            op.operator_name(),
            evaluation.cost_delta,
            op
        );

        op.apply(solution);
        self.state.clear_stale(solution);

        Some(AppliedMove {
            operator_name: op.operator_name(),
            evaluation,
            score: value,
        })
    }

    fn build_pairs(&mut self, solution: &WorkingSolution) {
        self.pairs.clear();
        let max = solution.routes().len().pow(2);

        for r1 in solution.route_ids() {
            for r2 in solution.route_ids() {
                let v1 = solution.route(r1).version();
                let v2 = solution.route(r2).version();
                if !self.state.contains_key((v1, v2)) {
                    self.pairs.push((r1, r2));
                }
            }
        }

        debug!(
            "Local Search: Built {} route pairs (max {}). Cache ratio: {}",
            self.pairs.len(),
            max,
            (max - self.pairs.len()) as f64 / max as f64
        );
    }
}

fn all_pairs(solution: &WorkingSolution) -> Vec<RoutePair> {
    solution
        .route_ids()
        .flat_map(|r1| solution.route_ids().map(move |r2| (r1, r2)))
        .collect()
}

/// Best improving move per pair of route versions, `None` when the pair has none.
struct LocalSearchState(FxHashMap<VersionPair, Option<LocalSearchMove>>);

impl LocalSearchState {
    fn new() -> Self {
        Self(FxHashMap::with_capacity_and_hasher(
            256,
            FxBuildHasher::default(),
        ))
    }

    fn contains_key(&self, versions: VersionPair) -> bool {
        self.0.contains_key(&versions)
    }

    fn best_move(
        &self,
        solution: &WorkingSolution,
        r1: RouteIdx,
        r2: RouteIdx,
    ) -> Option<&LocalSearchMove> {
        let key = (solution.route(r1).version(), solution.route(r2).version());
        self.0.get(&key).and_then(|entry| entry.as_ref())
    }

    fn update_best(
        &mut self,
        solution: &WorkingSolution,
        r1: RouteIdx,
        r2: RouteIdx,
        best_move: Option<LocalSearchMove>,
    ) {
        let key = (solution.route(r1).version(), solution.route(r2).version());
        self.0.insert(key, best_move);
    }

    fn clear_stale(&mut self, solution: &WorkingSolution) {
        let versions = solution
            .routes()
            .iter()
            .map(|route| route.version())
            .collect::<FxHashSet<_>>();

        self.0
            .retain(|&(v1, v2), _| versions.contains(&v1) && versions.contains(&v2));
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::{
        solver::constraints::constraint::{compute_solution_score, default_constraints},
        test_utils::{self, TestModelOptions},
    };

    fn cost(evaluation: &MoveEvaluation) -> i64 {
        evaluation.cost_delta
    }

    #[test]
    fn test_descent_reaches_optimum_on_line() {
        let model = test_utils::create_line_model(7, 2, TestModelOptions::default());
        let mut solution = test_utils::create_test_working_solution(
            &model,
            vec![vec![4, 1, 6], vec![3, 5, 2]],
        );
        let mut local_search = LocalSearch::new(&model);

        let mut before = solution.objective();
        while let Some(applied) = local_search.improve(&mut solution, &cost) {
            assert!(applied.evaluation.cost_delta < 0);
            assert_eq!(solution.objective(), before + applied.evaluation.cost_delta);
            before = solution.objective();
        }

        // every stop in one route going out and back
        assert_eq!(solution.objective(), 12);
    }

    #[test]
    fn test_descent_keeps_constraints() {
        let model = test_utils::create_grid_model(
            3,
            3,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![5, 5]),
                demands: Some(vec![0, 1, 1, 1, 1, 1, 1, 1, 1]),
                distance_capacity: Some(10_000),
                span_coefficient: 2,
                pickups_deliveries: vec![(8, 1), (3, 7)],
            },
        );
        let mut solution = test_utils::create_test_working_solution(
            &model,
            vec![vec![8, 2, 1, 4], vec![3, 5, 6, 7]],
        );
        let mut local_search = LocalSearch::new(&model);
        let start = solution.objective();

        while local_search.improve(&mut solution, &cost).is_some() {}

        let (score, _) = compute_solution_score(&default_constraints(), &solution);
        assert_eq!(score.hard_score, 0);
        assert!(solution.is_complete());
        assert!(solution.objective() <= start);
    }

    #[test]
    fn test_random_move_is_feasible() {
        let model = test_utils::create_line_model(
            6,
            2,
            TestModelOptions {
                vehicle_capacities: Some(vec![3, 3]),
                demands: Some(vec![0, 1, 1, 1, 1, 1]),
                ..TestModelOptions::default()
            },
        );
        let solution =
            test_utils::create_test_working_solution(&model, vec![vec![1, 2, 3], vec![4, 5]]);
        let local_search = LocalSearch::new(&model);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..20 {
            if let Some((op, _)) = local_search.random_move(&solution, &mut rng) {
                assert!(op.evaluate(&solution).is_some());
            }
        }
    }
}
