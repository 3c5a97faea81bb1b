//! Modelgate Error Types
//!
//! Errors raised while loading the catalog or talking to the account store.
//! Authorization outcomes are not errors; see [`crate::gate::Rejection`].

use thiserror::Error;

/// Main error type for modelgate operations
#[derive(Debug, Error)]
pub enum GateError {
    /// Catalog errors (invalid JSON, dangling allow-list entries, duplicate ids, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Account store failure outside of the debit path
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors reported by an [`crate::store::AccountStore`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Account store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer in time
    #[error("Account store timed out: {0}")]
    Timeout(String),

    /// No account with this id
    #[error("Account '{0}' not found")]
    AccountNotFound(String),

    /// The store answered with a status the protocol does not define
    #[error("Account store returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The exchange broke off after the request was sent, or the answer
    /// could not be decoded
    #[error("Account store response error: {0}")]
    Response(String),

    /// A debit id was replayed with a different account or amount
    #[error("Debit '{0}' was already used for a different account or amount")]
    DebitIdConflict(String),
}

impl StoreError {
    /// Whether the store may have applied the debit even though no usable
    /// answer came back. The request was sent and the reply was lost or
    /// unreadable.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Response(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(err.to_string())
        } else if err.is_connect() {
            StoreError::Unavailable(format!("Connection failed: {}", err))
        } else if err.is_decode() || err.is_body() {
            StoreError::Response(format!("Failed to decode response: {}", err))
        } else if err.is_builder() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Response(format!("Request interrupted: {}", err))
        }
    }
}

/// Result type alias for modelgate operations
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::UnexpectedStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Account store returned status 502: bad gateway"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: GateError = StoreError::AccountNotFound("acct-1".to_string()).into();
        assert_eq!(err.to_string(), "Account 'acct-1' not found");
    }

    #[test]
    fn test_indeterminate_store_errors() {
        assert!(StoreError::Timeout("slow".to_string()).is_indeterminate());
        assert!(StoreError::Response("garbled".to_string()).is_indeterminate());
        assert!(!StoreError::Unavailable("refused".to_string()).is_indeterminate());
        assert!(!StoreError::AccountNotFound("acct".to_string()).is_indeterminate());
        assert!(!StoreError::UnexpectedStatus {
            status: 503,
            body: String::new()
        }
        .is_indeterminate());
    }
}
