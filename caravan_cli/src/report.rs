use caravan_optimizer::solver::solution::routing_solution::{RoutingSolution, VehicleRoute};
use comfy_table::{Table, presets::UTF8_FULL};

fn end_cumul(route: &VehicleRoute, dimension: &str) -> Option<i64> {
    route
        .cumuls
        .iter()
        .find(|cumuls| cumuls.dimension == dimension)
        .and_then(|cumuls| cumuls.values.last().copied())
}

fn itinerary(route: &VehicleRoute) -> String {
    route
        .nodes
        .iter()
        .map(|node| node.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Per-vehicle itinerary followed by a summary table.
pub fn print_solution(solution: &RoutingSolution) {
    println!("Objective: {}", solution.objective);

    let mut max_route_distance = 0;
    for route in &solution.routes {
        let distance = end_cumul(route, "Distance").unwrap_or(route.cost);
        max_route_distance = max_route_distance.max(distance);

        println!("Route for vehicle {}:", route.vehicle);
        println!("{}", itinerary(route));
        println!("Distance of the route: {distance}m");
        if let Some(load) = end_cumul(route, "Capacity") {
            println!("Load of the route: {load}");
        }
        println!();
    }
    println!("Maximum of the route distances: {max_route_distance}m");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec![
        "Vehicle".to_string(),
        "Stops".to_string(),
        "Distance".to_string(),
        "Cost".to_string(),
    ];
    header.extend(
        solution
            .dimensions
            .iter()
            .map(|dimension| dimension.dimension.clone()),
    );
    table.set_header(header);

    for route in &solution.routes {
        let mut row = vec![
            route.vehicle.to_string(),
            route.nodes.len().saturating_sub(2).to_string(),
            format!("{:.1}", route.distance),
            route.cost.to_string(),
        ];
        row.extend(solution.dimensions.iter().map(|dimension| {
            end_cumul(route, &dimension.dimension)
                .map_or_else(String::new, |value| value.to_string())
        }));
        table.add_row(row);
    }

    println!("{table}");

    let statistics = &solution.statistics;
    if let Some(strategy) = statistics.first_solution_strategy {
        let fallback = statistics
            .fallback_strategy
            .map_or_else(String::new, |fallback| format!(", fallback to {fallback}"));
        println!(
            "First solution: {} ({}){}",
            strategy,
            statistics.first_solution_objective.unwrap_or_default(),
            fallback
        );
    }
    println!(
        "Score: {}hard/{}soft",
        solution.score.hard_score, solution.score.soft_score
    );
    println!(
        "Used vehicles: {}, iterations: {}, improvements: {}{}",
        solution.used_vehicles(),
        statistics.iterations,
        statistics.improvements,
        if solution.time_limited {
            ", time limited"
        } else {
            ""
        }
    );
}
