//! Model Routing
//!
//! The dispatch key handed to the provider layer for an authorized model.

use crate::error::{GateError, Result};
use crate::registry::model::Provider;

/// Provider and upstream model name for one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoute {
    /// Provider that serves the model
    pub provider: Provider,

    /// Model name as the provider knows it (e.g., "gpt-4o-mini")
    pub model: String,
}

impl ModelRoute {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Parse a route in the format "provider/model"
    ///
    /// Everything after the first slash is the model name, so OpenRouter
    /// style names like "openrouter/meta-llama/llama-3-70b" keep their vendor prefix.
    pub fn parse(route: &str) -> Result<Self> {
        let (provider, model) = route.split_once('/').ok_or_else(|| {
            GateError::Config(format!(
                "Invalid route '{}'. Expected 'provider/model'",
                route
            ))
        })?;

        let provider = Provider::from_name(provider).ok_or_else(|| {
            GateError::Config(format!("Unknown provider '{}' in route '{}'", provider, route))
        })?;

        if model.is_empty() {
            return Err(GateError::Config(format!(
                "Route '{}' has an empty model name",
                route
            )));
        }

        Ok(Self::new(provider, model))
    }
}

impl std::fmt::Display for ModelRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}
