pub mod arc_cost_constraint;
pub mod constraint;
pub mod dimension_capacity_constraint;
pub mod global_constraint;
pub mod global_span_constraint;
pub mod pickup_delivery_constraint;
pub mod route_constraint;
pub mod unassigned_node_constraint;
