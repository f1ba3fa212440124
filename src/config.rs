//! Provider configuration
//!
//! The upstream provider is chosen and configured from the environment:
//! 1. `RIKO_*` variables (highest)
//! 2. The provider's conventional key variable (`OPENAI_API_KEY`, ...)
//! 3. Default values (lowest)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI API (chat completions + responses)
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
}

impl ProviderType {
    /// Get the default API base URL for this provider type
    pub fn default_base_url(&self) -> &str {
        match self {
            ProviderType::OpenAI => "https://api.openai.com/v1",
            ProviderType::Anthropic => "https://api.anthropic.com",
            ProviderType::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Model used when none is configured
    pub fn default_model(&self) -> &str {
        match self {
            ProviderType::OpenAI => "gpt-4o-mini",
            ProviderType::Anthropic => "claude-3-5-haiku-latest",
            ProviderType::Gemini => "gemini-1.5-flash",
        }
    }

    /// Conventional environment variable holding this provider's key
    pub fn api_key_env(&self) -> &str {
        match self {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
            ProviderType::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Name used in logs and fallback replies
    pub fn display_name(&self) -> &str {
        match self {
            ProviderType::OpenAI => "OpenAI",
            ProviderType::Anthropic => "Anthropic",
            ProviderType::Gemini => "Gemini",
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "anthropic" => Ok(ProviderType::Anthropic),
            "gemini" => Ok(ProviderType::Gemini),
            _ => Err(Error::Config(format!(
                "Invalid provider type: {}. Must be 'openai', 'anthropic' or 'gemini'",
                s
            ))),
        }
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ProviderType,

    /// API base URL
    pub api_base: String,

    /// API key
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model for text-only conversations
    pub model: Option<String>,

    /// Model for conversations with attachments (defaults to `model`)
    pub vision_model: Option<String>,

    /// Maximum tokens for multimodal replies (default: 1024)
    pub max_tokens: Option<u32>,

    /// Request timeout; unset means the HTTP client's default (none)
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    fn with_defaults(provider_type: ProviderType, api_base: String, api_key: String) -> Self {
        ProviderConfig {
            provider_type,
            api_base,
            api_key,
            model: None,
            vision_model: None,
            max_tokens: None,
            timeout_secs: None,
        }
    }

    /// OpenAI provider with default settings
    pub fn openai(api_base: String, api_key: String) -> Self {
        Self::with_defaults(ProviderType::OpenAI, api_base, api_key)
    }

    /// Anthropic provider with default settings
    pub fn anthropic(api_base: String, api_key: String) -> Self {
        Self::with_defaults(ProviderType::Anthropic, api_base, api_key)
    }

    /// Gemini provider with default settings
    pub fn gemini(api_base: String, api_key: String) -> Self {
        Self::with_defaults(ProviderType::Gemini, api_base, api_key)
    }

    /// Load configuration from the process environment
    ///
    /// Environment variables:
    /// - `RIKO_PROVIDER` - Provider type (openai/anthropic/gemini, default openai)
    /// - `RIKO_API_KEY` - API key, falling back to `OPENAI_API_KEY`,
    ///   `ANTHROPIC_API_KEY` or `GEMINI_API_KEY`
    /// - `RIKO_API_BASE` - API base URL
    /// - `RIKO_MODEL` / `RIKO_VISION_MODEL` - Model names
    /// - `RIKO_MAX_TOKENS` - Max tokens for multimodal replies
    /// - `RIKO_TIMEOUT_SECS` - Upstream request timeout
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider_type = match get("RIKO_PROVIDER") {
            Some(name) => name.parse()?,
            None => ProviderType::OpenAI,
        };

        let api_key = get("RIKO_API_KEY")
            .or_else(|| get(provider_type.api_key_env()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "API key is missing: set RIKO_API_KEY or {}",
                    provider_type.api_key_env()
                ))
            })?;

        let api_base = get("RIKO_API_BASE").unwrap_or_else(|| provider_type.default_base_url().to_string());

        Ok(ProviderConfig {
            provider_type,
            api_base,
            api_key,
            model: get("RIKO_MODEL"),
            vision_model: get("RIKO_VISION_MODEL"),
            max_tokens: parse_number(get("RIKO_MAX_TOKENS"), "RIKO_MAX_TOKENS")?,
            timeout_secs: parse_number(get("RIKO_TIMEOUT_SECS"), "RIKO_TIMEOUT_SECS")?,
        })
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the API base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Model for text-only requests
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider_type.default_model())
    }

    /// Model for requests carrying attachments
    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or_else(|| self.model())
    }

    /// Get the max_tokens value, falling back to 1024
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(1024)
    }

    /// Explicit upstream timeout, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Parse an optional positive integer setting; zero is rejected
fn parse_number<T: TryFrom<u64>>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .and_then(|n| T::try_from(n).ok())
                .ok_or_else(|| Error::Config(format!("{} must be a positive number, got '{}'", key, v)))
        })
        .transpose()
}
