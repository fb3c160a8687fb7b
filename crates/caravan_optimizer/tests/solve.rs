use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};

use caravan_optimizer::{
    model::routing_model::{RoutingModel, RoutingModelBuilder},
    problem::{data_model::RoutingDataModelBuilder, distance_matrix::DistanceMatrix},
    solver::{
        search::SolveOutcome,
        search_params::{FirstSolutionStrategy, LocalSearchMetaheuristic, SearchParameters, Threads},
        solution::routing_solution::RoutingSolution,
        solver::Solver,
    },
};

struct Instance {
    points: Vec<(f64, f64)>,
    vehicles: usize,
    capacities: Option<Vec<i64>>,
    demands: Option<Vec<i64>>,
    pairs: Vec<(usize, usize)>,
    span_coefficient: i64,
}

impl Instance {
    fn build(&self) -> Arc<RoutingModel> {
        let mut data_builder = RoutingDataModelBuilder::from_matrix(
            DistanceMatrix::from_euclidean(&self.points),
            self.vehicles,
            0,
        );
        if let Some(capacities) = &self.capacities {
            data_builder.with_vehicle_capacities(capacities.clone());
        }
        if let Some(demands) = &self.demands {
            data_builder.with_demands(demands.clone());
        }
        if !self.pairs.is_empty() {
            data_builder.with_pickups_and_deliveries(self.pairs.clone());
        }

        let mut builder = RoutingModelBuilder::new(Arc::new(data_builder.build().unwrap()));
        let distance = builder.register_distance_callback();
        builder
            .add_dimension(distance, 0, 100_000, true, "Distance")
            .unwrap();
        builder
            .set_global_span_cost_coefficient("Distance", self.span_coefficient)
            .unwrap();

        if let Some(demands) = &self.demands {
            let demand = builder.register_demand_callback(demands.clone()).unwrap();
            builder
                .add_dimension_with_vehicle_capacity(demand, 0, true, "Capacity")
                .unwrap();
        }
        if !self.pairs.is_empty() {
            builder
                .add_pickup_and_delivery_constraint("Distance")
                .unwrap();
        }

        Arc::new(builder.build().unwrap())
    }
}

fn grid_points(rows: usize, cols: usize) -> Vec<(f64, f64)> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col as f64 * 10.0, row as f64 * 7.0)))
        .collect()
}

fn solve(model: Arc<RoutingModel>, params: SearchParameters) -> SolveOutcome {
    Solver::new(model, params).solve()
}

fn expect_solved(outcome: SolveOutcome) -> RoutingSolution {
    match outcome {
        SolveOutcome::Solved(solution) => *solution,
        SolveOutcome::Infeasible(reason) => panic!("expected a solution, got: {reason}"),
    }
}

fn visited(solution: &RoutingSolution) -> Vec<Vec<usize>> {
    solution
        .routes
        .iter()
        .map(|route| {
            let nodes = route.nodes.iter().map(|node| node.get()).collect::<Vec<_>>();
            nodes[1..nodes.len() - 1].to_vec()
        })
        .collect()
}

fn assert_valid(solution: &RoutingSolution, instance: &Instance) {
    let routes = visited(solution);

    assert!(!solution.score.is_failure(), "{:?}", solution.score_analysis);
    assert_eq!(solution.score.soft_score, solution.objective);

    let mut seen = vec![0; instance.points.len()];
    for node in routes.iter().flatten() {
        seen[*node] += 1;
    }
    assert_eq!(seen[0], 0, "the depot is not a stop");
    assert!(seen[1..].iter().all(|&count| count == 1), "{routes:?}");

    for &(pickup, delivery) in &instance.pairs {
        let route = routes.iter().find(|route| route.contains(&pickup)).unwrap();
        let pickup_position = route.iter().position(|&node| node == pickup);
        let delivery_position = route.iter().position(|&node| node == delivery);
        assert!(delivery_position.is_some(), "pair ({pickup}, {delivery}) split");
        assert!(pickup_position < delivery_position);
    }

    if let Some(capacities) = &instance.capacities {
        for route in &solution.routes {
            let loads = route
                .cumuls
                .iter()
                .find(|cumuls| cumuls.dimension == "Capacity")
                .unwrap();
            let capacity = capacities[route.vehicle.get()];
            assert!(loads.values.iter().all(|&load| load <= capacity));
        }
    }
}

#[test]
fn test_unit_square_perimeter() {
    let model = {
        let mut builder = RoutingModelBuilder::new(Arc::new(
            RoutingDataModelBuilder::new(
                vec![
                    vec![0.0, 1.0, 2.0, 1.0],
                    vec![1.0, 0.0, 1.0, 2.0],
                    vec![2.0, 1.0, 0.0, 1.0],
                    vec![1.0, 2.0, 1.0, 0.0],
                ],
                1,
                0,
            )
            .build()
            .unwrap(),
        ));
        builder.register_distance_callback();
        Arc::new(builder.build().unwrap())
    };

    let solution = expect_solved(solve(model, SearchParameters::default()));

    assert_eq!(solution.objective, 4);
    assert_eq!(visited(&solution)[0].len(), 3);
}

#[test]
fn test_two_stop_pickup_and_delivery() {
    let instance = Instance {
        points: vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)],
        vehicles: 1,
        capacities: None,
        demands: None,
        pairs: vec![(1, 2)],
        span_coefficient: 0,
    };

    let solution = expect_solved(solve(instance.build(), SearchParameters::default()));

    assert_eq!(visited(&solution), vec![vec![1, 2]]);
    assert_eq!(solution.objective, 4);
    assert_eq!(
        solution.statistics.first_solution_strategy,
        Some(FirstSolutionStrategy::ParallelCheapestInsertion)
    );
}

#[test]
fn test_total_demand_over_fleet_capacity_is_infeasible() {
    let instance = Instance {
        points: vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)],
        vehicles: 2,
        capacities: Some(vec![3, 3]),
        demands: Some(vec![0, 2, 2, 3]),
        pairs: vec![],
        span_coefficient: 0,
    };

    assert!(solve(instance.build(), SearchParameters::default()).is_infeasible());
}

#[test]
fn test_unpackable_demands_are_infeasible() {
    let instance = Instance {
        points: vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)],
        vehicles: 2,
        capacities: Some(vec![3, 3]),
        demands: Some(vec![0, 2, 2, 2]),
        pairs: vec![],
        span_coefficient: 0,
    };

    let SolveOutcome::Infeasible(reason) = solve(instance.build(), SearchParameters::default())
    else {
        panic!("three loads of 2 do not fit two vehicles of 3");
    };
    assert!(!reason.is_empty());
}

#[test]
fn test_demand_equal_to_capacity_is_feasible() {
    let instance = Instance {
        points: vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
        vehicles: 2,
        capacities: Some(vec![3, 3]),
        demands: Some(vec![0, 3, 3]),
        pairs: vec![],
        span_coefficient: 0,
    };

    let solution = expect_solved(solve(instance.build(), SearchParameters::default()));

    assert_valid(&solution, &instance);
    assert_eq!(solution.used_vehicles(), 2);
}

fn constrained_instance() -> Instance {
    let points = grid_points(4, 5);
    let mut demands = vec![1; points.len()];
    demands[0] = 0;
    demands[7] = 3;

    Instance {
        points,
        vehicles: 4,
        capacities: Some(vec![8, 8, 8, 8]),
        demands: Some(demands),
        pairs: vec![(3, 12), (17, 5), (9, 14)],
        span_coefficient: 10,
    }
}

#[test]
fn test_every_strategy_gives_a_valid_assignment() {
    let instance = constrained_instance();
    let model = instance.build();

    for strategy in FirstSolutionStrategy::ALL {
        let solution = expect_solved(solve(
            Arc::clone(&model),
            SearchParameters {
                first_solution_strategy: strategy,
                max_iterations: 200,
                ..SearchParameters::default()
            },
        ));

        assert_valid(&solution, &instance);
        assert!(!solution.time_limited);
    }
}

#[test]
fn test_local_search_never_worse_than_first_solution() {
    let instance = constrained_instance();
    let model = instance.build();

    for metaheuristic in LocalSearchMetaheuristic::ALL {
        let solution = expect_solved(solve(
            Arc::clone(&model),
            SearchParameters {
                local_search_metaheuristic: Some(metaheuristic),
                max_iterations: 150,
                max_iterations_without_improvement: 40,
                ..SearchParameters::default()
            },
        ));

        assert_valid(&solution, &instance);
        let first = solution.statistics.first_solution_objective.unwrap();
        assert!(solution.objective <= first, "{metaheuristic}: {} > {first}", solution.objective);
    }
}

#[test]
fn test_fixed_seed_is_deterministic() {
    let instance = constrained_instance();
    let model = instance.build();
    let params = SearchParameters {
        local_search_metaheuristic: Some(LocalSearchMetaheuristic::SimulatedAnnealing),
        threads: Threads::Multi(4),
        max_iterations: 300,
        seed: 42,
        ..SearchParameters::default()
    };

    let first = expect_solved(solve(Arc::clone(&model), params.clone()));
    let second = expect_solved(solve(model, params));

    assert_eq!(visited(&first), visited(&second));
    assert_eq!(first.objective, second.objective);
}

#[test]
fn test_time_limit_returns_the_best_assignment() {
    let instance = constrained_instance();
    let started = Timestamp::now();

    let solution = expect_solved(solve(
        instance.build(),
        SearchParameters {
            local_search_metaheuristic: Some(LocalSearchMetaheuristic::GuidedLocalSearch),
            time_limit: Some(SignedDuration::from_secs(1)),
            max_iterations: usize::MAX,
            max_iterations_without_improvement: usize::MAX,
            ..SearchParameters::default()
        },
    ));

    assert!(solution.time_limited);
    assert!(Timestamp::now().duration_since(started) < SignedDuration::from_secs(30));
    assert_valid(&solution, &instance);
    assert!(solution.objective <= solution.statistics.first_solution_objective.unwrap());
}
