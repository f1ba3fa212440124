//! Provider creation

use super::{
    client::{AnthropicClient, Client, GeminiClient, OpenAIClient},
    config::{ProviderConfig, ProviderType},
    Result,
};

/// Create an LLM client based on the provider configuration.
///
/// Returns a trait object so callers are decoupled from concrete provider
/// types. Adding a new provider only requires a new match arm here.
pub fn create_client(config: ProviderConfig) -> Result<Box<dyn Client>> {
    tracing::debug!(
        "Creating {} client for {}",
        config.provider_type.display_name(),
        config.api_base()
    );
    match config.provider_type {
        ProviderType::OpenAI => Ok(Box::new(OpenAIClient::new(config)?)),
        ProviderType::Anthropic => Ok(Box::new(AnthropicClient::new(config)?)),
        ProviderType::Gemini => Ok(Box::new(GeminiClient::new(config)?)),
    }
}
