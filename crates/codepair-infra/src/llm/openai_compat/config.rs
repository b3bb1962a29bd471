//! Configuration for OpenAI-compatible chat completion endpoints.
//!
//! Ollama, llama.cpp, vLLM and LM Studio all expose `/v1/chat/completions`;
//! an [`OpenAiCompatConfig`] points the provider at one of them.

use std::time::Duration;

use secrecy::SecretString;

use codepair_types::config::OracleSettings;

/// Placeholder key sent when none is configured. Local servers ignore it.
pub const LOCAL_API_KEY: &str = "ollama";

/// Configuration for an OpenAI-compatible provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Name reported by the provider (e.g. "openai_compatible").
    pub provider_name: String,
    /// Base URL including the `/v1` suffix.
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    /// Connect timeout and idle read timeout for each request.
    pub timeout: Duration,
}

impl OpenAiCompatConfig {
    pub fn from_settings(settings: &OracleSettings) -> Self {
        let key = settings
            .api_key
            .clone()
            .unwrap_or_else(|| LOCAL_API_KEY.to_string());

        Self {
            provider_name: settings.provider.to_string(),
            base_url: compat_base_url(settings.endpoint()),
            api_key: SecretString::from(key),
            model: settings.model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Append `/v1` to a server root unless it is already there.
pub fn compat_base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepair_types::llm::ProviderType;
    use secrecy::ExposeSecret;

    #[test]
    fn test_compat_base_url() {
        assert_eq!(compat_base_url("http://localhost:11434"), "http://localhost:11434/v1");
        assert_eq!(compat_base_url("http://localhost:11434/"), "http://localhost:11434/v1");
        assert_eq!(compat_base_url("http://localhost:8080/v1"), "http://localhost:8080/v1");
        assert_eq!(compat_base_url("http://localhost:8080/v1/"), "http://localhost:8080/v1");
    }

    #[test]
    fn test_from_settings_defaults_api_key() {
        let settings = OracleSettings {
            provider: ProviderType::OpenAiCompatible,
            ..OracleSettings::default()
        };
        let config = OpenAiCompatConfig::from_settings(&settings);
        assert_eq!(config.provider_name, "openai_compatible");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.api_key.expose_secret(), LOCAL_API_KEY);
        assert_eq!(config.model, "deepseek-r1:1.5b");
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_from_settings_keeps_explicit_key() {
        let settings = OracleSettings {
            provider: ProviderType::OpenAiCompatible,
            base_url: "http://gpu-box:8000/v1".to_string(),
            api_key: Some("sk-local".to_string()),
            timeout_secs: 30,
            ..OracleSettings::default()
        };
        let config = OpenAiCompatConfig::from_settings(&settings);
        assert_eq!(config.base_url, "http://gpu-box:8000/v1");
        assert_eq!(config.api_key.expose_secret(), "sk-local");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
