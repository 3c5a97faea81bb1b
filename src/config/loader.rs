//! Configuration Loader
//!
//! Layers catalog files over the built-in catalog. Each layer overrides models
//! by id and tiers by name; the last layer wins.

use crate::config::catalog::{Catalog, CatalogConfig};
use crate::error::{GateError, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an extra catalog file
pub const CATALOG_PATH_ENV: &str = "MODELGATE_CATALOG_PATH";

const BUILTIN_CATALOG: &str = include_str!("../../catalog.json");

/// Builds the effective catalog configuration from its layers
pub struct ConfigLoader {
    config: CatalogConfig,
}

impl ConfigLoader {
    /// Built-in catalog only
    pub fn builtin() -> Result<Self> {
        let config = serde_json::from_str(BUILTIN_CATALOG).map_err(|e| {
            GateError::Config(format!("Failed to parse built-in catalog: {}", e))
        })?;
        Ok(Self { config })
    }

    /// Built-in catalog plus every override file found in the standard locations
    pub fn new() -> Result<Self> {
        let mut loader = Self::builtin()?;
        for path in Self::override_paths() {
            if path.is_file() {
                loader.layer_file(&path)?;
            }
        }
        Ok(loader)
    }

    /// Built-in catalog plus one explicit file, which must exist
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::builtin()?;
        loader.layer_file(path.as_ref())?;
        Ok(loader)
    }

    /// Override locations, most general first
    fn override_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".modelgate").join("catalog.json"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("modelgate").join("catalog.json"));
        }
        paths.push(PathBuf::from("modelgate.json"));
        if let Ok(custom_path) = std::env::var(CATALOG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    fn layer_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GateError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let layer: CatalogConfig = serde_json::from_str(&content).map_err(|e| {
            GateError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded catalog overrides");
        self.config.merge(layer);
        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Validate the merged configuration and freeze it
    pub fn into_catalog(self) -> Result<Catalog> {
        self.config.build()
    }
}
