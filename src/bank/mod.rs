pub mod bank;
pub mod bank_model;
pub mod banks;
pub mod components;
pub mod factory;
