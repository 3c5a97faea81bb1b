//! Model Registry
//!
//! Read-only catalog of invokable models. Built once from configuration and
//! shared by reference; cost and display metadata live in the same entry so
//! what is shown and what is billed cannot drift apart.

use crate::error::{GateError, Result};
use crate::registry::model::{ModelCategory, ModelDescriptor};
use crate::registry::route::ModelRoute;
use std::collections::HashMap;

/// Immutable lookup table of models keyed by id
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    /// Descriptors in catalog order
    models: Vec<ModelDescriptor>,

    /// Position of each id in `models`
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    /// Build a registry, rejecting empty and duplicate ids
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(models.len());

        for (pos, model) in models.iter().enumerate() {
            if model.id.trim().is_empty() {
                return Err(GateError::Config(format!(
                    "Model at position {} has an empty id",
                    pos
                )));
            }

            if let Some(prev) = index.insert(model.id.clone(), pos) {
                return Err(GateError::Config(format!(
                    "Duplicate model id '{}' ({} model at position {} and {} model at position {})",
                    model.id, models[prev].category, prev, model.category, pos
                )));
            }
        }

        Ok(Self { models, index })
    }

    /// Look up a model by id. Unknown ids never fall back to a default model.
    pub fn lookup(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.index.get(model_id).map(|&pos| &self.models[pos])
    }

    /// Token cost of a model, failing the same way as [`ModelRegistry::lookup`]
    pub fn cost_of(&self, model_id: &str) -> Option<u64> {
        self.lookup(model_id).map(|m| m.cost)
    }

    /// Provider dispatch key for a model
    pub fn route(&self, model_id: &str) -> Option<ModelRoute> {
        self.lookup(model_id)
            .map(|m| ModelRoute::new(m.provider, m.upstream_model.clone()))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.index.contains_key(model_id)
    }

    /// Models of one category, in catalog order
    pub fn models(&self, category: ModelCategory) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |m| m.category == category)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::model::Provider;

    fn descriptor(id: &str, cost: u64, category: ModelCategory) -> ModelDescriptor {
        ModelDescriptor {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            description: String::new(),
            cost,
            category,
            provider: Provider::OpenAi,
            upstream_model: format!("upstream-{}", id),
        }
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new(vec![
            descriptor("free-model", 0, ModelCategory::Chat),
            descriptor("paid-model", 50, ModelCategory::Chat),
            descriptor("painter", 20, ModelCategory::Image),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        let model = registry.lookup("paid-model").unwrap();
        assert_eq!(model.cost, 50);
        assert_eq!(model.display_name, "PAID-MODEL");
        assert!(registry.lookup("missing").is_none());
        assert!(registry.lookup("").is_none());
        assert!(registry.contains("painter"));
        assert!(!registry.contains("Painter"));
    }

    #[test]
    fn test_cost_of() {
        let registry = registry();
        assert_eq!(registry.cost_of("free-model"), Some(0));
        assert_eq!(registry.cost_of("painter"), Some(20));
        assert_eq!(registry.cost_of("missing"), None);
    }

    #[test]
    fn test_route_uses_explicit_provider() {
        let registry = registry();
        let route = registry.route("painter").unwrap();
        assert_eq!(route.provider, Provider::OpenAi);
        assert_eq!(route.model, "upstream-painter");
        assert!(registry.route("missing").is_none());
    }

    #[test]
    fn test_models_by_category_keep_order() {
        let registry = registry();
        let chat: Vec<_> = registry
            .models(ModelCategory::Chat)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(chat, vec!["free-model", "paid-model"]);
        assert_eq!(registry.models(ModelCategory::Image).count(), 1);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_ids_across_categories_rejected() {
        let err = ModelRegistry::new(vec![
            descriptor("shared", 0, ModelCategory::Chat),
            descriptor("shared", 5, ModelCategory::Image),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate model id 'shared'"));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(ModelRegistry::new(vec![descriptor(" ", 0, ModelCategory::Chat)]).is_err());
    }
}
