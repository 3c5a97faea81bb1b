//! Ledger HTTP Client
//!
//! [`AccountStore`] backed by a remote ledger service. The ledger performs the
//! conditional debit server-side; this client never retries a debit.
//!
//! Protocol:
//! - `GET  {base}/accounts/{id}` -> `200 {"id", "tier", "token_balance"}`, `404` unknown
//! - `POST {base}/accounts/{id}/debit` with `{"amount": n}` and an
//!   `Idempotency-Key` header -> `200 {"new_balance": n}`, `409 {"available": n}`
//!   or `422` when the key was already used for a different debit
//!
//! The ledger deduplicates on `Idempotency-Key`: a key it has already applied
//! answers `200` with the balance of that debit and takes nothing more.

use crate::error::{GateError, Result, StoreError};
use crate::store::{Account, AccountStore, DebitOutcome};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL of the ledger
pub const LEDGER_URL_ENV: &str = "MODELGATE_LEDGER_URL";
/// Bearer token sent to the ledger
pub const LEDGER_TOKEN_ENV: &str = "MODELGATE_LEDGER_TOKEN";
/// Per-request timeout in milliseconds
pub const LEDGER_TIMEOUT_ENV: &str = "MODELGATE_LEDGER_TIMEOUT_MS";

const IDEMPOTENCY_KEY: &str = "idempotency-key";

/// Connection settings for the ledger service
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl LedgerSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(4),
        }
    }

    /// Read settings from `MODELGATE_LEDGER_*` environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(LEDGER_URL_ENV)
            .map_err(|_| GateError::Config(format!("{} is not set", LEDGER_URL_ENV)))?;

        let mut settings = Self::new(base_url);
        settings.token = std::env::var(LEDGER_TOKEN_ENV).ok().filter(|t| !t.is_empty());

        if let Ok(raw) = std::env::var(LEDGER_TIMEOUT_ENV) {
            let millis = raw.parse::<u64>().map_err(|e| {
                GateError::Config(format!("Invalid {} '{}': {}", LEDGER_TIMEOUT_ENV, raw, e))
            })?;
            settings.timeout = Duration::from_millis(millis);
        }

        Ok(settings)
    }
}

#[derive(Serialize)]
struct DebitRequest {
    amount: u64,
}

#[derive(Deserialize)]
struct DebitResponse {
    new_balance: u64,
}

#[derive(Deserialize)]
struct InsufficientResponse {
    available: u64,
}

/// Account store that talks to the ledger over HTTP
pub struct HttpAccountStore {
    /// Inner reqwest client
    client: Client,

    /// Ledger root, always ending in a path that can take segments
    base_url: Url,

    /// Whole-request timeout handed to the client
    timeout: Duration,
}

impl HttpAccountStore {
    /// Create a new ledger client
    pub fn new(settings: LedgerSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            GateError::Config(format!("Invalid ledger URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GateError::Config(format!(
                "Ledger URL '{}' cannot be used as a base",
                settings.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GateError::Config(format!("Invalid ledger token format: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout.min(Duration::from_secs(2)))
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .build()
            .map_err(|e| GateError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout: settings.timeout,
        })
    }

    fn account_url(
        &self,
        account_id: &str,
        action: Option<&str>,
    ) -> std::result::Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Unavailable(format!("Ledger URL '{}' cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty().push("accounts").push(account_id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, StoreError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        StoreError::Response(format!(
            "Failed to parse ledger response: {}. Body: {}",
            e,
            body.chars().take(200).collect::<String>()
        ))
    })
}

async fn unexpected(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::UnexpectedStatus { status, body }
}

#[async_trait]
impl AccountStore for HttpAccountStore {
    async fn fetch_account(&self, account_id: &str) -> std::result::Result<Account, StoreError> {
        let url = self.account_url(account_id, None)?;
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => read_json(response).await,
            StatusCode::NOT_FOUND => Err(StoreError::AccountNotFound(account_id.to_string())),
            _ => Err(unexpected(response).await),
        }
    }

    async fn conditional_debit(
        &self,
        account_id: &str,
        amount: u64,
        debit_id: &str,
    ) -> std::result::Result<DebitOutcome, StoreError> {
        let url = self.account_url(account_id, Some("debit"))?;
        let response = self
            .client
            .post(url)
            .header(IDEMPOTENCY_KEY, debit_id)
            .json(&DebitRequest { amount })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: DebitResponse = read_json(response).await?;
                Ok(DebitOutcome::Debited {
                    new_balance: body.new_balance,
                })
            }
            StatusCode::CONFLICT => {
                let body: InsufficientResponse = read_json(response).await?;
                Ok(DebitOutcome::Insufficient {
                    available: body.available,
                })
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                Err(StoreError::DebitIdConflict(debit_id.to_string()))
            }
            StatusCode::NOT_FOUND => Err(StoreError::AccountNotFound(account_id.to_string())),
            _ => Err(unexpected(response).await),
        }
    }

    fn request_timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
