pub mod arc_penalties;
pub mod assignment;
pub mod route;
pub mod route_change;
pub mod route_id;
pub mod routing_solution;
pub mod working_solution;
