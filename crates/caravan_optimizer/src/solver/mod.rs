pub mod constraints;
pub mod construction;
pub mod insertion;
pub mod insertion_cache;
pub mod ls;
pub mod metaheuristic;
pub mod score;
pub mod search;
pub mod search_params;
pub mod solution;
pub mod solver;
pub mod statistics;
pub mod termination;
