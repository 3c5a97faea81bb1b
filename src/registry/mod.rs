//! Registry Module
//!
//! Model catalog lookups and provider routing.

pub mod catalog;
pub mod model;
pub mod route;

pub use catalog::ModelRegistry;
pub use model::{ModelCategory, ModelDescriptor, Provider};
pub use route::ModelRoute;
