//! Entitlement Gate
//!
//! Decides whether an account may invoke a model and charges for it exactly
//! once before dispatch. Per request the gate moves through
//! `received -> checking -> charging -> authorized`, leaving early as
//! `rejected`, as `charge_failed` when the store refuses or cannot be reached,
//! or as `charge_unconfirmed` when a sent debit never got a usable answer.
//!
//! Every debit carries a debit id the store applies at most once. Replaying
//! the id of an unconfirmed charge through
//! [`EntitlementGate::authorize_with_debit_id`] either returns the debit that
//! already landed or performs it now.

pub mod outcome;

pub use outcome::{Authorization, Charge, Rejection};

use crate::config::Catalog;
use crate::error::GateError;
use crate::registry::ModelRoute;
use crate::store::{Account, AccountStore, DebitOutcome};
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Gate in front of every chat and image-generation request
pub struct EntitlementGate {
    catalog: Arc<Catalog>,
    store: Arc<dyn AccountStore>,
}

impl EntitlementGate {
    /// Create a gate over a catalog and a store.
    ///
    /// The catalog's debit timeout must be at least the store's own request
    /// timeout.
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn AccountStore>,
    ) -> crate::error::Result<Self> {
        let debit_timeout = catalog.settings.debit_timeout();
        if let Some(request_timeout) = store.request_timeout() {
            if debit_timeout < request_timeout {
                return Err(GateError::Config(format!(
                    "gate.debit_timeout_ms ({}ms) is shorter than the account store request timeout ({}ms)",
                    debit_timeout.as_millis(),
                    request_timeout.as_millis()
                )));
            }
        }

        Ok(Self { catalog, store })
    }

    /// Authorize one invocation of `model_id` by `account` under a fresh debit id.
    ///
    /// Every failure is returned as a [`Rejection`]; nothing is debited unless
    /// the result is [`Authorization::Authorized`] for a paid model, or
    /// [`Rejection::ChargeUnconfirmed`] whose debit id has not been replayed yet.
    pub async fn authorize(&self, account: &Account, model_id: &str) -> Authorization {
        let debit_id = Uuid::new_v4().to_string();
        self.authorize_with_debit_id(account, model_id, &debit_id).await
    }

    /// Authorize with a caller-chosen debit id, which the store applies at most once
    pub async fn authorize_with_debit_id(
        &self,
        account: &Account,
        model_id: &str,
        debit_id: &str,
    ) -> Authorization {
        let span = tracing::debug_span!(
            "authorize",
            account = %account.id,
            tier = %account.tier,
            model = %model_id,
            debit_id = %debit_id
        );

        let authorization = self
            .check_and_charge(account, model_id, debit_id)
            .instrument(span)
            .await;

        if let Authorization::Rejected(rejection) = &authorization {
            tracing::debug!(
                account = %account.id,
                model = %model_id,
                kind = rejection.kind(),
                "request rejected: {}",
                rejection
            );
        }

        authorization
    }

    async fn check_and_charge(
        &self,
        account: &Account,
        model_id: &str,
        debit_id: &str,
    ) -> Authorization {
        let registry = &self.catalog.registry;

        let Some(model) = registry.lookup(model_id) else {
            return Rejection::ModelNotFound {
                model_id: model_id.to_string(),
            }
            .into();
        };

        tracing::trace!(category = %model.category, cost = model.cost, "checking entitlement");

        let policy = self.catalog.tiers.policy(account.tier);
        if !policy.allows(model.category, &model.id) {
            return Rejection::NotEntitled {
                tier: account.tier,
                model_id: model.id.clone(),
            }
            .into();
        }

        let route = ModelRoute::new(model.provider, model.upstream_model.clone());

        // Free models never touch the balance
        if model.is_free() {
            tracing::debug!(route = %route, "authorized free model");
            return Authorization::Authorized(Charge {
                model_id: model.id.clone(),
                route,
                cost: 0,
                new_balance: None,
                debit_id: None,
                charged_at: Utc::now(),
            });
        }

        tracing::trace!(amount = model.cost, "charging");

        let timeout = self.catalog.settings.debit_timeout();
        let debit = tokio::time::timeout(
            timeout,
            self.store.conditional_debit(&account.id, model.cost, debit_id),
        )
        .await;

        match debit {
            Ok(Ok(DebitOutcome::Debited { new_balance })) => {
                tracing::info!(
                    account = %account.id,
                    model = %model.id,
                    cost = model.cost,
                    new_balance,
                    debit_id,
                    "tokens debited"
                );
                Authorization::Authorized(Charge {
                    model_id: model.id.clone(),
                    route,
                    cost: model.cost,
                    new_balance: Some(new_balance),
                    debit_id: Some(debit_id.to_string()),
                    charged_at: Utc::now(),
                })
            }
            Ok(Ok(DebitOutcome::Insufficient { available })) => {
                Rejection::InsufficientBalance {
                    required: model.cost,
                    available,
                }
                .into()
            }
            Ok(Err(e)) if e.is_indeterminate() => {
                tracing::warn!(
                    account = %account.id,
                    model = %model.id,
                    debit_id,
                    error = %e,
                    "debit outcome unknown"
                );
                Rejection::ChargeUnconfirmed {
                    debit_id: debit_id.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }
            Ok(Err(e)) => {
                tracing::warn!(account = %account.id, model = %model.id, error = %e, "debit failed");
                Rejection::ChargeFailed {
                    reason: e.to_string(),
                }
                .into()
            }
            Err(_) => {
                tracing::warn!(
                    account = %account.id,
                    model = %model.id,
                    debit_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "debit timed out"
                );
                Rejection::ChargeUnconfirmed {
                    debit_id: debit_id.to_string(),
                    reason: format!("debit not confirmed within {}ms", timeout.as_millis()),
                }
                .into()
            }
        }
    }
}
