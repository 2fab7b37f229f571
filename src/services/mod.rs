pub mod mapping_service;
pub mod mapping_store;
pub mod validation;

pub use mapping_service::*;
pub use mapping_store::*;
pub use validation::*;
