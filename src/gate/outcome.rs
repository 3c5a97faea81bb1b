//! Authorization Outcomes
//!
//! What [`super::EntitlementGate::authorize`] hands back to the dispatch layer.

use crate::registry::ModelRoute;
use crate::tier::AccountTier;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Receipt of an authorized invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    pub model_id: String,

    /// Where the dispatch layer should send the request
    pub route: ModelRoute,

    /// Tokens debited; 0 for free models
    pub cost: u64,

    /// Balance after the debit, `None` when no debit took place
    pub new_balance: Option<u64>,

    /// Idempotency key of the debit, `None` for free models
    pub debit_id: Option<String>,

    pub charged_at: DateTime<Utc>,
}

impl Charge {
    pub fn is_free(&self) -> bool {
        self.cost == 0
    }
}

/// Why a request was not allowed to proceed. No rejection debits the balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Requested model id is not in the registry
    #[error("Model '{model_id}' does not exist")]
    ModelNotFound { model_id: String },

    /// The account's tier does not include the model
    #[error("Model '{model_id}' is not available on the {tier} tier")]
    NotEntitled { tier: AccountTier, model_id: String },

    /// Balance is below the model's cost
    #[error("Insufficient balance: {required} tokens required, {available} available")]
    InsufficientBalance { required: u64, available: u64 },

    /// The account store refused or could not be reached; nothing was taken
    #[error("Charge could not be confirmed: {reason}")]
    ChargeFailed { reason: String },

    /// The debit was sent but no usable answer came back, so it may have been
    /// applied. Authorizing again with the same `debit_id` settles it without
    /// charging twice.
    #[error("Charge outcome unknown for debit {debit_id}: {reason}")]
    ChargeUnconfirmed { debit_id: String, reason: String },
}

impl Rejection {
    /// Stable code for mapping to caller-facing statuses
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::ModelNotFound { .. } => "model_not_found",
            Rejection::NotEntitled { .. } => "not_entitled",
            Rejection::InsufficientBalance { .. } => "insufficient_balance",
            Rejection::ChargeFailed { .. } => "charge_failed",
            Rejection::ChargeUnconfirmed { .. } => "charge_unconfirmed",
        }
    }

    /// Whether a fresh authorization is safe. Only a failed charge qualifies;
    /// an unconfirmed one must be replayed with its own debit id instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Rejection::ChargeFailed { .. })
    }

    /// Debit id to replay, for a charge whose outcome is unknown
    pub fn debit_id(&self) -> Option<&str> {
        match self {
            Rejection::ChargeUnconfirmed { debit_id, .. } => Some(debit_id),
            _ => None,
        }
    }
}

/// Result of an authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized(Charge),
    Rejected(Rejection),
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }

    pub fn charge(&self) -> Option<&Charge> {
        match self {
            Authorization::Authorized(charge) => Some(charge),
            Authorization::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Authorization::Authorized(_) => None,
            Authorization::Rejected(rejection) => Some(rejection),
        }
    }

    /// Convert into a `Result` so callers can use `?`
    pub fn into_result(self) -> Result<Charge, Rejection> {
        match self {
            Authorization::Authorized(charge) => Ok(charge),
            Authorization::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<Rejection> for Authorization {
    fn from(rejection: Rejection) -> Self {
        Authorization::Rejected(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        let rejection = Rejection::InsufficientBalance {
            required: 50,
            available: 30,
        };
        assert_eq!(
            rejection.to_string(),
            "Insufficient balance: 50 tokens required, 30 available"
        );

        let rejection = Rejection::NotEntitled {
            tier: AccountTier::Guest,
            model_id: "paid-model".to_string(),
        };
        assert_eq!(
            rejection.to_string(),
            "Model 'paid-model' is not available on the guest tier"
        );
    }

    #[test]
    fn test_only_charge_failures_are_retryable() {
        let rejections = [
            Rejection::ModelNotFound {
                model_id: "x".to_string(),
            },
            Rejection::NotEntitled {
                tier: AccountTier::Regular,
                model_id: "x".to_string(),
            },
            Rejection::InsufficientBalance {
                required: 2,
                available: 1,
            },
        ];
        assert!(rejections.iter().all(|r| !r.is_retryable()));
        assert!(Rejection::ChargeFailed {
            reason: "connection refused".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_unconfirmed_charge_carries_debit_id() {
        let rejection = Rejection::ChargeUnconfirmed {
            debit_id: "debit-1".to_string(),
            reason: "ledger timed out".to_string(),
        };
        assert!(!rejection.is_retryable());
        assert_eq!(rejection.kind(), "charge_unconfirmed");
        assert_eq!(rejection.debit_id(), Some("debit-1"));
        assert_eq!(
            rejection.to_string(),
            "Charge outcome unknown for debit debit-1: ledger timed out"
        );
        assert_eq!(
            Rejection::ModelNotFound {
                model_id: "x".to_string()
            }
            .debit_id(),
            None
        );
    }

    #[test]
    fn test_into_result() {
        let authorization: Authorization = Rejection::ModelNotFound {
            model_id: "x".to_string(),
        }
        .into();
        assert!(!authorization.is_authorized());
        assert_eq!(authorization.rejection().map(|r| r.kind()), Some("model_not_found"));
        assert!(authorization.into_result().is_err());
    }
}
