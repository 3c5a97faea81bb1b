//! Modelgate - token-metered model routing and entitlement gating
//!
//! Every chat or image-generation request passes through [`ModelGate`] before
//! an upstream provider is called: the model is resolved in the catalog, the
//! account's tier is checked against the model's allow-list, and paid models
//! are charged with a single atomic conditional debit.

use std::path::Path;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod gate;
pub mod registry;
pub mod store;
pub mod telemetry;
pub mod tier;

use config::{Catalog, ConfigLoader};
use error::Result;
use gate::{Authorization, EntitlementGate};
use registry::{ModelCategory, ModelDescriptor, ModelRegistry};
use store::{Account, AccountStore, HttpAccountStore, LedgerSettings};
use tier::AccountTier;

/// The main entry point: catalog plus entitlement gate
pub struct ModelGate {
    /// Validated catalog, shared with the gate
    catalog: Arc<Catalog>,

    /// Account store used for lookups and debits
    store: Arc<dyn AccountStore>,

    gate: EntitlementGate,
}

impl ModelGate {
    /// Create a gate with the catalog from default locations
    pub fn new(store: Arc<dyn AccountStore>) -> Result<Self> {
        let catalog = ConfigLoader::new()?.into_catalog()?;
        Self::from_catalog(catalog, store)
    }

    /// Create a gate with a custom catalog file layered over the built-in one
    pub fn with_config_path(
        path: impl AsRef<Path>,
        store: Arc<dyn AccountStore>,
    ) -> Result<Self> {
        let catalog = ConfigLoader::from_path(path)?.into_catalog()?;
        Self::from_catalog(catalog, store)
    }

    /// Create a gate backed by the HTTP ledger configured in the environment
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let store = HttpAccountStore::new(LedgerSettings::from_env()?)?;
        Self::new(Arc::new(store))
    }

    /// Create a gate from an already validated catalog
    pub fn from_catalog(catalog: Catalog, store: Arc<dyn AccountStore>) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let gate = EntitlementGate::new(catalog.clone(), store.clone())?;

        tracing::debug!(
            models = catalog.registry.len(),
            debit_timeout_ms = catalog.settings.debit_timeout_ms,
            "model gate ready"
        );

        Ok(Self {
            catalog,
            store,
            gate,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.catalog.registry
    }

    /// Authorize one invocation; see [`EntitlementGate::authorize`]
    pub async fn authorize(&self, account: &Account, model_id: &str) -> Authorization {
        self.gate.authorize(account, model_id).await
    }

    /// Authorize under a known debit id; see [`EntitlementGate::authorize_with_debit_id`]
    pub async fn authorize_with_debit_id(
        &self,
        account: &Account,
        model_id: &str,
        debit_id: &str,
    ) -> Authorization {
        self.gate
            .authorize_with_debit_id(account, model_id, debit_id)
            .await
    }

    /// Look the account up in the store, then authorize.
    ///
    /// A failed lookup is an error, not a rejection: the gate never ran.
    pub async fn authorize_account_id(
        &self,
        account_id: &str,
        model_id: &str,
    ) -> Result<Authorization> {
        let account = self.store.fetch_account(account_id).await?;
        Ok(self.gate.authorize(&account, model_id).await)
    }

    /// Models a tier may invoke in a category, in catalog order
    pub fn available_models(
        &self,
        tier: AccountTier,
        category: ModelCategory,
    ) -> Vec<&ModelDescriptor> {
        let policy = self.catalog.tiers.policy(tier);
        self.catalog
            .registry
            .models(category)
            .filter(|m| policy.allows(category, &m.id))
            .collect()
    }

    /// Daily message ceiling of a tier, for the host's rate limiter
    pub fn max_messages_per_day(&self, tier: AccountTier) -> u32 {
        self.catalog.tiers.max_messages_per_day(tier)
    }
}
