pub mod common;
pub mod config;
pub mod data_set;
pub mod errors;
pub mod export;
pub mod mapping;
pub mod services;
