//! Account Tiers
//!
//! Each tier owns an explicit allow-list of chat and image model ids plus the
//! daily message ceiling enforced by the host's rate limiter.

use crate::error::{GateError, Result};
use crate::registry::{ModelCategory, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Account classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountTier {
    Guest,
    Regular,
}

impl AccountTier {
    /// Every tier; each must have a policy in the catalog
    pub const ALL: [AccountTier; 2] = [AccountTier::Guest, AccountTier::Regular];
}

impl fmt::Display for AccountTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountTier::Guest => write!(f, "guest"),
            AccountTier::Regular => write!(f, "regular"),
        }
    }
}

/// Entitlements of a single tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierPolicy {
    /// Daily message ceiling (enforced by the caller, not by the gate)
    pub max_messages_per_day: u32,

    /// Chat models this tier may invoke
    #[serde(default)]
    pub available_chat_model_ids: Vec<String>,

    /// Image models this tier may invoke
    #[serde(default)]
    pub available_image_model_ids: Vec<String>,
}

impl TierPolicy {
    /// Allow-list for a model category
    pub fn allow_list(&self, category: ModelCategory) -> &[String] {
        match category {
            ModelCategory::Chat => &self.available_chat_model_ids,
            ModelCategory::Image => &self.available_image_model_ids,
        }
    }

    /// Check membership in the allow-list of the given category
    pub fn allows(&self, category: ModelCategory, model_id: &str) -> bool {
        self.allow_list(category).iter().any(|id| id == model_id)
    }
}

/// Validated tier-to-policy mapping
#[derive(Debug, Clone)]
pub struct TierTable {
    policies: HashMap<AccountTier, TierPolicy>,
}

impl TierTable {
    /// Validate policies against the registry.
    ///
    /// Every tier needs a policy, and every allow-list entry must name a
    /// registered model of the list's category.
    pub fn new(
        policies: HashMap<AccountTier, TierPolicy>,
        registry: &ModelRegistry,
    ) -> Result<Self> {
        for tier in AccountTier::ALL {
            let policy = policies.get(&tier).ok_or_else(|| {
                GateError::Config(format!("No policy configured for tier '{}'", tier))
            })?;

            for category in [ModelCategory::Chat, ModelCategory::Image] {
                let mut seen = HashSet::new();
                for id in policy.allow_list(category) {
                    let model = registry.lookup(id).ok_or_else(|| {
                        GateError::Config(format!(
                            "Tier '{}' allows unknown {} model '{}'",
                            tier, category, id
                        ))
                    })?;

                    if model.category != category {
                        return Err(GateError::Config(format!(
                            "Tier '{}' lists {} model '{}' among its {} models",
                            tier, model.category, id, category
                        )));
                    }

                    if !seen.insert(id.as_str()) {
                        tracing::warn!(%tier, model = %id, "duplicate allow-list entry");
                    }
                }
            }
        }

        Ok(Self { policies })
    }

    /// Policy of a tier. Total over [`AccountTier::ALL`] once validated.
    pub fn policy(&self, tier: AccountTier) -> &TierPolicy {
        static EMPTY: TierPolicy = TierPolicy {
            max_messages_per_day: 0,
            available_chat_model_ids: Vec::new(),
            available_image_model_ids: Vec::new(),
        };
        self.policies.get(&tier).unwrap_or(&EMPTY)
    }

    /// Daily message ceiling for a tier
    pub fn max_messages_per_day(&self, tier: AccountTier) -> u32 {
        self.policy(tier).max_messages_per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ModelDescriptor, Provider};

    fn registry() -> ModelRegistry {
        let model = |id: &str, cost, category| ModelDescriptor {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            cost,
            category,
            provider: Provider::OpenAi,
            upstream_model: id.to_string(),
        };
        ModelRegistry::new(vec![
            model("free-model", 0, ModelCategory::Chat),
            model("paid-model", 50, ModelCategory::Chat),
            model("painter", 20, ModelCategory::Image),
        ])
        .unwrap()
    }

    fn policy(chat: &[&str], image: &[&str]) -> TierPolicy {
        TierPolicy {
            max_messages_per_day: 10,
            available_chat_model_ids: chat.iter().map(|s| s.to_string()).collect(),
            available_image_model_ids: image.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_deserialize_tier_policies() {
        let json = r#"{
            "guest": {
                "max_messages_per_day": 20,
                "available_chat_model_ids": ["free-model"]
            },
            "regular": {
                "max_messages_per_day": 100,
                "available_chat_model_ids": ["free-model", "paid-model"],
                "available_image_model_ids": ["painter"]
            }
        }"#;

        let policies: HashMap<AccountTier, TierPolicy> = serde_json::from_str(json).unwrap();
        let table = TierTable::new(policies, &registry()).unwrap();
        assert_eq!(table.max_messages_per_day(AccountTier::Guest), 20);
        assert!(table.policy(AccountTier::Guest).available_image_model_ids.is_empty());
        assert!(table
            .policy(AccountTier::Regular)
            .allows(ModelCategory::Image, "painter"));
    }

    #[test]
    fn test_allows_is_category_scoped() {
        let policy = policy(&["free-model"], &["painter"]);
        assert!(policy.allows(ModelCategory::Chat, "free-model"));
        assert!(!policy.allows(ModelCategory::Image, "free-model"));
        assert!(!policy.allows(ModelCategory::Chat, "painter"));
    }

    #[test]
    fn test_missing_tier_rejected() {
        let policies = [(AccountTier::Guest, policy(&["free-model"], &[]))]
            .into_iter()
            .collect();
        let err = TierTable::new(policies, &registry()).unwrap_err();
        assert!(err.to_string().contains("tier 'regular'"));
    }

    #[test]
    fn test_dangling_allow_list_entry_rejected() {
        let policies = [
            (AccountTier::Guest, policy(&["free-model"], &[])),
            (AccountTier::Regular, policy(&["gone-model"], &[])),
        ]
        .into_iter()
        .collect();
        let err = TierTable::new(policies, &registry()).unwrap_err();
        assert!(err.to_string().contains("unknown chat model 'gone-model'"));
    }

    #[test]
    fn test_wrong_category_rejected() {
        let policies = [
            (AccountTier::Guest, policy(&["painter"], &[])),
            (AccountTier::Regular, policy(&[], &[])),
        ]
        .into_iter()
        .collect();
        assert!(TierTable::new(policies, &registry()).is_err());
    }
}
