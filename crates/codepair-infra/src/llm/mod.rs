//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait
//! defined in `codepair-core`: the native Ollama API and the
//! OpenAI-compatible chat completions API.
//!
//! Also provides a provider factory ([`create_provider`]) that builds the
//! right provider from [`OracleSettings`], and a connectivity probe
//! ([`check_connection`]).
//!
//! [`LlmProvider`]: codepair_core::llm::provider::LlmProvider

pub mod ollama;
pub mod openai_compat;

use codepair_core::llm::box_provider::BoxLlmProvider;
use codepair_types::config::OracleSettings;
use codepair_types::llm::{CompletionRequest, LlmError, Message, MessageRole, ProviderType};

use self::ollama::OllamaProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] from resolved [`OracleSettings`].
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn create_provider(settings: &OracleSettings) -> Result<BoxLlmProvider, LlmError> {
    let provider = match settings.provider {
        ProviderType::Ollama => BoxLlmProvider::new(OllamaProvider::from_settings(settings)?),
        ProviderType::OpenAiCompatible => BoxLlmProvider::new(OpenAiCompatibleProvider::new(
            OpenAiCompatConfig::from_settings(settings),
        )?),
    };

    tracing::debug!(
        provider = provider.name(),
        model = %settings.model,
        endpoint = settings.endpoint(),
        "created completion provider"
    );
    Ok(provider)
}

/// Probe the provider by sending a minimal completion request.
///
/// Used by `codepair models --check` to verify the endpoint answers for
/// the configured model.
pub async fn check_connection(
    provider: &BoxLlmProvider,
    settings: &OracleSettings,
) -> Result<(), LlmError> {
    let request = CompletionRequest {
        model: settings.model.clone(),
        messages: vec![Message::new(MessageRole::User, "Hello")],
        temperature: Some(0.0),
        format: Default::default(),
        stream: false,
    };
    provider.complete(&request).await?;
    Ok(())
}
