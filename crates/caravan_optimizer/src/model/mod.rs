pub mod dimension;
pub mod index_manager;
pub mod routing_model;
pub mod transit;
