//! Catalog Configuration
//!
//! Defines the on-disk schema of the model catalog and turns it into the
//! validated, immutable [`Catalog`].

use crate::error::{GateError, Result};
use crate::registry::{ModelCategory, ModelDescriptor, ModelRegistry, ModelRoute};
use crate::tier::{AccountTier, TierPolicy, TierTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Chat models, in display order
    #[serde(default)]
    pub chat_models: Vec<ModelConfig>,

    /// Image generation models, in display order
    #[serde(default)]
    pub image_models: Vec<ModelConfig>,

    /// Per-tier entitlements keyed by tier name
    #[serde(default)]
    pub tiers: HashMap<AccountTier, TierPolicy>,

    /// Gate settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateSettings>,
}

/// Configuration for a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier exposed to clients
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Token price per invocation
    #[serde(default)]
    pub cost: u64,

    /// Upstream route as "provider/model"
    pub route: String,
}

impl ModelConfig {
    fn into_descriptor(self, category: ModelCategory) -> Result<ModelDescriptor> {
        let route = ModelRoute::parse(&self.route).map_err(|e| {
            GateError::Config(format!("Model '{}': {}", self.id, e))
        })?;

        Ok(ModelDescriptor {
            id: self.id,
            display_name: self.name,
            description: self.description,
            cost: self.cost,
            category,
            provider: route.provider,
            upstream_model: route.model,
        })
    }
}

/// Tunables of the entitlement gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSettings {
    /// Upper bound on a single debit round-trip before the request fails closed
    #[serde(default = "default_debit_timeout_ms")]
    pub debit_timeout_ms: u64,
}

fn default_debit_timeout_ms() -> u64 {
    5_000
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            debit_timeout_ms: default_debit_timeout_ms(),
        }
    }
}

impl GateSettings {
    pub fn debit_timeout(&self) -> Duration {
        Duration::from_millis(self.debit_timeout_ms)
    }
}

impl CatalogConfig {
    /// Merge another config into this one (later configs override earlier).
    ///
    /// Models are replaced by id in place, new ids are appended; tiers are
    /// replaced whole.
    pub fn merge(&mut self, other: CatalogConfig) {
        merge_models(&mut self.chat_models, other.chat_models);
        merge_models(&mut self.image_models, other.image_models);

        for (tier, policy) in other.tiers {
            self.tiers.insert(tier, policy);
        }

        if other.gate.is_some() {
            self.gate = other.gate;
        }
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<Catalog> {
        let mut models = Vec::with_capacity(self.chat_models.len() + self.image_models.len());
        for model in self.chat_models {
            models.push(model.into_descriptor(ModelCategory::Chat)?);
        }
        for model in self.image_models {
            models.push(model.into_descriptor(ModelCategory::Image)?);
        }

        let registry = ModelRegistry::new(models)?;
        let tiers = TierTable::new(self.tiers, &registry)?;
        let settings = self.gate.unwrap_or_default();

        if settings.debit_timeout_ms == 0 {
            return Err(GateError::Config(
                "gate.debit_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(Catalog {
            registry,
            tiers,
            settings,
        })
    }
}

fn merge_models(base: &mut Vec<ModelConfig>, overrides: Vec<ModelConfig>) {
    for model in overrides {
        match base.iter_mut().find(|m| m.id == model.id) {
            Some(existing) => *existing = model,
            None => base.push(model),
        }
    }
}

/// Validated catalog, constructed once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct Catalog {
    pub registry: ModelRegistry,
    pub tiers: TierTable,
    pub settings: GateSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Provider;

    fn model(id: &str, cost: u64, route: &str) -> ModelConfig {
        ModelConfig {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            cost,
            route: route.to_string(),
        }
    }

    fn config() -> CatalogConfig {
        CatalogConfig {
            chat_models: vec![
                model("free-model", 0, "openai/gpt-4o-mini"),
                model("paid-model", 50, "anthropic/claude-3-5-sonnet-latest"),
            ],
            image_models: vec![model("painter", 20, "openai/dall-e-3")],
            tiers: [
                (
                    AccountTier::Guest,
                    TierPolicy {
                        max_messages_per_day: 20,
                        available_chat_model_ids: vec!["free-model".to_string()],
                        available_image_model_ids: vec![],
                    },
                ),
                (
                    AccountTier::Regular,
                    TierPolicy {
                        max_messages_per_day: 100,
                        available_chat_model_ids: vec![
                            "free-model".to_string(),
                            "paid-model".to_string(),
                        ],
                        available_image_model_ids: vec!["painter".to_string()],
                    },
                ),
            ]
            .into_iter()
            .collect(),
            gate: None,
        }
    }

    #[test]
    fn test_deserialize_model_config() {
        let json = r#"{
            "id": "paid-model",
            "name": "Paid Model",
            "cost": 50,
            "route": "anthropic/claude-3-5-sonnet-latest"
        }"#;

        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cost, 50);
        assert!(config.description.is_empty());

        let descriptor = config.into_descriptor(ModelCategory::Chat).unwrap();
        assert_eq!(descriptor.provider, Provider::Anthropic);
        assert_eq!(descriptor.upstream_model, "claude-3-5-sonnet-latest");
    }

    #[test]
    fn test_build_assigns_categories() {
        let catalog = config().build().unwrap();
        let painter = catalog.registry.lookup("painter").unwrap();
        assert_eq!(painter.category, ModelCategory::Image);
        assert_eq!(catalog.settings, GateSettings::default());
    }

    #[test]
    fn test_build_rejects_bad_route() {
        let mut config = config();
        config.chat_models.push(model("odd", 1, "gpt-4"));
        let err = config.build().unwrap_err();
        assert!(err.to_string().contains("Model 'odd'"));
    }

    #[test]
    fn test_build_rejects_zero_timeout() {
        let mut config = config();
        config.gate = Some(GateSettings { debit_timeout_ms: 0 });
        assert!(config.build().is_err());
    }

    #[test]
    fn test_merge_overrides_by_id() {
        let mut base = config();
        base.merge(CatalogConfig {
            chat_models: vec![
                model("paid-model", 75, "anthropic/claude-3-5-sonnet-latest"),
                model("extra", 5, "groq/llama-3.1-70b-versatile"),
            ],
            gate: Some(GateSettings {
                debit_timeout_ms: 250,
            }),
            ..Default::default()
        });

        let ids: Vec<_> = base.chat_models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["free-model", "paid-model", "extra"]);
        assert_eq!(base.chat_models[1].cost, 75);
        assert_eq!(base.tiers.len(), 2);

        let catalog = base.build().unwrap();
        assert_eq!(catalog.settings.debit_timeout(), Duration::from_millis(250));
    }
}
