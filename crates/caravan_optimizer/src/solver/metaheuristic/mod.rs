pub mod greedy_descent;
pub mod guided_local_search;
pub mod search_context;
pub mod simulated_annealing;
pub mod tabu_search;
