pub mod data_model;
pub mod distance_matrix;
pub mod node;
pub mod pickup_delivery;
pub mod vehicle;
