pub mod data_model;
pub mod loader;
