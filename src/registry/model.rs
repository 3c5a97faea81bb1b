//! Model Descriptors
//!
//! One entry of the model catalog: presentation metadata, per-invocation
//! token cost, and the upstream provider that serves it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entitlement list a model is validated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    Chat,
    Image,
}

impl fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelCategory::Chat => write!(f, "chat"),
            ModelCategory::Image => write!(f, "image"),
        }
    }
}

/// Upstream SDK family that serves a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[serde(alias = "openai")]
    OpenAi,
    Anthropic,
    Google,
    Xai,
    Groq,
    #[serde(alias = "deepseek")]
    DeepSeek,
    #[serde(alias = "openrouter")]
    OpenRouter,
    Replicate,
}

impl Provider {
    /// Stable lowercase name, as used in routes and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::Xai => "xai",
            Provider::Groq => "groq",
            Provider::DeepSeek => "deepseek",
            Provider::OpenRouter => "openrouter",
            Provider::Replicate => "replicate",
        }
    }

    /// Parse a provider name, accepting the forms written by [`Provider::as_str`]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "openai" | "open_ai" => Some(Provider::OpenAi),
            "anthropic" => Some(Provider::Anthropic),
            "google" => Some(Provider::Google),
            "xai" => Some(Provider::Xai),
            "groq" => Some(Provider::Groq),
            "deepseek" | "deep_seek" => Some(Provider::DeepSeek),
            "openrouter" | "open_router" => Some(Provider::OpenRouter),
            "replicate" => Some(Provider::Replicate),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An invokable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    /// Identifier, unique across chat and image models
    pub id: String,

    /// Name shown to users
    pub display_name: String,

    /// Short description shown to users
    pub description: String,

    /// Token price per invocation; 0 means free
    pub cost: u64,

    pub category: ModelCategory,

    /// Provider that serves this model
    pub provider: Provider,

    /// Model name sent to the provider
    pub upstream_model: String,
}

impl ModelDescriptor {
    pub fn is_free(&self) -> bool {
        self.cost == 0
    }
}
