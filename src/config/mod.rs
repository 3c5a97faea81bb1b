//! Configuration Module
//!
//! Handles catalog loading and validation.

pub mod catalog;
pub mod loader;

pub use catalog::{Catalog, CatalogConfig, GateSettings, ModelConfig};
pub use loader::ConfigLoader;
