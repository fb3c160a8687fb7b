pub mod cheapest_insertion;
pub mod construct_solution;
pub mod path_cheapest_arc;
pub mod savings;
