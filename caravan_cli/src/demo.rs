use std::sync::Arc;

use caravan_optimizer::{
    error::ModelError,
    model::routing_model::{RoutingModel, RoutingModelBuilder},
    problem::{data_model::RoutingDataModelBuilder, distance_matrix::DistanceMatrix},
    solver::{
        search::SolveOutcome,
        search_params::{FirstSolutionStrategy, LocalSearchMetaheuristic, SearchParameters},
        solver::Solver,
    },
};
use clap::Args;
use tracing::{info, warn};

use crate::{parsers, report};

const NUM_VEHICLES: usize = 5;
const VEHICLE_CAPACITY: i64 = 50;
const DISTANCE_CAPACITY: i64 = 3000;
const DISTANCE_SPAN_COEFFICIENT: i64 = 100;

#[rustfmt::skip]
const POINTS: [(f64, f64); 157] = [
    (769.0, 259.0), (91.0, 377.0), (108.0, 338.0), (816.0, 567.0), (725.0, 520.0), (117.0, 357.0),
    (766.0, 559.0), (90.0, 417.0), (255.0, 430.0), (63.0, 384.0), (35.0, 276.0), (122.0, 318.0),
    (85.0, 322.0), (267.0, 348.0), (937.0, 546.0), (865.0, 461.0), (863.0, 547.0), (724.0, 431.0),
    (148.0, 144.0), (243.0, 571.0), (871.0, 512.0), (782.0, 596.0), (77.0, 272.0), (776.0, 650.0),
    (166.0, 371.0), (69.0, 239.0), (972.0, 607.0), (320.0, 521.0), (91.0, 434.0), (20.0, 305.0),
    (81.0, 271.0), (776.0, 669.0), (830.0, 553.0), (148.0, 243.0), (160.0, 202.0), (741.0, 527.0),
    (877.0, 561.0), (587.0, 551.0), (808.0, 435.0), (26.0, 278.0), (58.0, 394.0), (755.0, 444.0),
    (817.0, 557.0), (165.0, 367.0), (216.0, 510.0), (124.0, 330.0), (96.0, 587.0), (132.0, 369.0),
    (163.0, 234.0), (915.0, 492.0), (753.0, 657.0), (161.0, 319.0), (37.0, 227.0), (898.0, 747.0),
    (770.0, 524.0), (745.0, 582.0), (695.0, 469.0), (124.0, 355.0), (11.0, 283.0), (258.0, 406.0),
    (72.0, 335.0), (713.0, 399.0), (866.0, 626.0), (214.0, 344.0), (213.0, 349.0), (864.0, 577.0),
    (98.0, 440.0), (701.0, 512.0), (884.0, 559.0), (842.0, 518.0), (125.0, 379.0), (352.0, 410.0),
    (206.0, 228.0), (825.0, 592.0), (93.0, 252.0), (863.0, 511.0), (98.0, 347.0), (115.0, 326.0),
    (71.0, 392.0), (96.0, 248.0), (65.0, 404.0), (75.0, 342.0), (140.0, 300.0), (129.0, 340.0),
    (129.0, 273.0), (846.0, 696.0), (109.0, 463.0), (863.0, 586.0), (139.0, 356.0), (77.0, 351.0),
    (154.0, 322.0), (231.0, 323.0), (115.0, 394.0), (844.0, 558.0), (98.0, 454.0), (739.0, 568.0),
    (179.0, 443.0), (862.0, 618.0), (764.0, 764.0), (844.0, 554.0), (174.0, 319.0), (703.0, 319.0),
    (151.0, 453.0), (863.0, 569.0), (72.0, 473.0), (632.0, 575.0), (823.0, 578.0), (26.0, 42.0),
    (47.0, 381.0), (71.0, 336.0), (754.0, 484.0), (137.0, 465.0), (80.0, 355.0), (172.0, 296.0),
    (28.0, 310.0), (754.0, 579.0), (531.0, 662.0), (87.0, 382.0), (866.0, 481.0), (93.0, 337.0),
    (942.0, 567.0), (788.0, 567.0), (824.0, 451.0), (926.0, 901.0), (182.0, 500.0), (98.0, 384.0),
    (104.0, 370.0), (48.0, 462.0), (952.0, 629.0), (239.0, 324.0), (138.0, 516.0), (747.0, 605.0),
    (136.0, 460.0), (748.0, 624.0), (43.0, 268.0), (792.0, 597.0), (95.0, 352.0), (109.0, 413.0),
    (67.0, 224.0), (104.0, 386.0), (817.0, 672.0), (183.0, 360.0), (922.0, 652.0), (779.0, 419.0),
    (863.0, 721.0), (40.0, 456.0), (66.0, 395.0), (862.0, 465.0), (383.0, 357.0), (307.0, 434.0),
    (233.0, 421.0), (329.0, 280.0), (623.0, 554.0), (103.0, 349.0), (736.0, 688.0), (75.0, 266.0),
    (174.0, 406.0),
];

#[derive(Args)]
pub struct DemoArgs {
    #[arg(long, value_parser = parsers::parse_first_solution_strategy, default_value = "AUTOMATIC")]
    strategy: FirstSolutionStrategy,

    #[arg(long, value_parser = parsers::parse_metaheuristic)]
    metaheuristic: Option<LocalSearchMetaheuristic>,

    /// Time limit for the search (e.g., "30s", "5m", "PT1H30M")
    #[arg(short, long, value_parser = parsers::parse_duration)]
    timeout: Option<jiff::SignedDuration>,
}

/// The 157 stop instance: two pickup and delivery pairs, a distance cap per vehicle and a
/// span cost on the longest route.
pub fn build_model() -> Result<RoutingModel, ModelError> {
    let mut demands = vec![1; POINTS.len()];
    demands[0] = 0;
    demands[1] = 45;

    let mut data_builder = RoutingDataModelBuilder::from_matrix(
        DistanceMatrix::from_euclidean(&POINTS),
        NUM_VEHICLES,
        0,
    );
    data_builder
        .with_pickups_and_deliveries(vec![(1, 3), (2, 10)])
        .with_vehicle_capacities(vec![VEHICLE_CAPACITY; NUM_VEHICLES])
        .with_demands(demands.clone());

    let mut builder = RoutingModelBuilder::new(Arc::new(data_builder.build()?));

    let distance = builder.register_distance_callback();
    builder.add_dimension(distance, 0, DISTANCE_CAPACITY, true, "Distance")?;
    builder.set_global_span_cost_coefficient("Distance", DISTANCE_SPAN_COEFFICIENT)?;

    let demand = builder.register_demand_callback(demands)?;
    builder.add_dimension_with_vehicle_capacity(demand, 0, true, "Capacity")?;

    builder.add_pickup_and_delivery_constraint("Distance")?;

    builder.build()
}

pub fn run(args: DemoArgs) -> Result<(), anyhow::Error> {
    info!("Program started");

    let params = SearchParameters {
        first_solution_strategy: args.strategy,
        local_search_metaheuristic: args.metaheuristic,
        time_limit: args.timeout,
        ..SearchParameters::default()
    };

    let solver = Solver::new(Arc::new(build_model()?), params);

    match solver.solve() {
        SolveOutcome::Solved(solution) => report::print_solution(&solution),
        SolveOutcome::Infeasible(reason) => warn!("No solution found: {reason}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use caravan_optimizer::solver::search_params::Threads;
    use jiff::SignedDuration;

    use super::*;

    fn solve(params: SearchParameters) -> SolveOutcome {
        let model = build_model().unwrap();
        Solver::new(Arc::new(model), params).solve()
    }

    #[test]
    fn test_demo_is_solved_with_default_parameters() {
        let outcome = solve(SearchParameters {
            time_limit: Some(SignedDuration::from_secs(10)),
            ..SearchParameters::default()
        });

        let SolveOutcome::Solved(solution) = outcome else {
            panic!("the demo instance has a feasible assignment");
        };

        let mut visited = solution
            .routes
            .iter()
            .flat_map(|route| &route.nodes[1..route.nodes.len() - 1])
            .map(|node| node.get())
            .collect::<Vec<_>>();
        visited.sort_unstable();
        assert_eq!(visited, (1..POINTS.len()).collect::<Vec<_>>());

        for route in &solution.routes {
            let distances = route
                .cumuls
                .iter()
                .find(|cumuls| cumuls.dimension == "Distance")
                .unwrap();
            assert!(
                distances
                    .values
                    .iter()
                    .all(|&distance| distance <= DISTANCE_CAPACITY)
            );
        }
    }

    #[test]
    fn test_demo_is_solved_by_savings() {
        let outcome = solve(SearchParameters {
            first_solution_strategy: FirstSolutionStrategy::Savings,
            threads: Threads::Single,
            time_limit: Some(SignedDuration::from_secs(5)),
            ..SearchParameters::default()
        });

        assert!(!outcome.is_infeasible());
    }
}
