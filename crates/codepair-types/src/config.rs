//! Configuration types for codepair.
//!
//! `FileConfig` is the on-disk `config.toml`; every field is optional.
//! `OracleSettings` is the resolved, validated configuration the completion
//! oracle is built from. It is fixed for the lifetime of a session.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::{OutputFormat, ProviderType};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";

/// Default model server endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Default HTTP timeout for one oracle call, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Resolved oracle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSettings {
    pub provider: ProviderType,
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub format: OutputFormat,
    pub timeout_secs: u64,
    /// Only used by OpenAI-compatible servers that require a key.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            format: OutputFormat::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

impl OracleSettings {
    /// Check the settings before any provider is built from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "base_url".to_string(),
                message: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                key: "temperature".to_string(),
                message: "must be between 0 and 2".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Contents of `config.toml`. Missing keys fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub provider: Option<ProviderType>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub format: Option<OutputFormat>,
    pub timeout_secs: Option<u64>,
    pub api_key: Option<String>,
    /// Models offered by the model picker.
    pub models: Vec<String>,
}

impl FileConfig {
    /// Overlay the values present in this file onto `settings`.
    pub fn apply_to(&self, settings: &mut OracleSettings) {
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
        if let Some(ref model) = self.model {
            settings.model = model.clone();
        }
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.timeout_secs = timeout_secs;
        }
        if self.api_key.is_some() {
            settings.api_key = self.api_key.clone();
        }
    }

    /// The model picker's choices: the configured list, or the default model.
    pub fn model_choices(&self) -> Vec<String> {
        if self.models.is_empty() {
            vec![DEFAULT_MODEL.to_string()]
        } else {
            self.models.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_settings_defaults() {
        let s = OracleSettings::default();
        assert_eq!(s.model, "deepseek-r1:1.5b");
        assert_eq!(s.base_url, "http://localhost:11434");
        assert!((s.temperature - 0.3).abs() < f64::EPSILON);
        assert_eq!(s.format, OutputFormat::Text);
        assert_eq!(s.provider, ProviderType::Ollama);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = OracleSettings::default();
        s.temperature = 3.5;
        assert!(s.validate().is_err());

        let mut s = OracleSettings::default();
        s.base_url = "localhost:11434".to_string();
        assert!(s.validate().is_err());

        let mut s = OracleSettings::default();
        s.model = "  ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut s = OracleSettings::default();
        s.base_url = "http://gpu-box:11434/".to_string();
        assert_eq!(s.endpoint(), "http://gpu-box:11434");
    }

    #[test]
    fn test_file_config_deserialize_empty() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.model_choices(), vec!["deepseek-r1:1.5b".to_string()]);
    }

    #[test]
    fn test_file_config_apply_to() {
        let toml_str = r#"
model = "qwen2.5-coder:7b"
temperature = 0.1
format = "json"
models = ["qwen2.5-coder:7b", "deepseek-r1:1.5b"]
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let mut settings = OracleSettings::default();
        config.apply_to(&mut settings);

        assert_eq!(settings.model, "qwen2.5-coder:7b");
        assert!((settings.temperature - 0.1).abs() < f64::EPSILON);
        assert_eq!(settings.format, OutputFormat::Json);
        // Untouched keys keep their defaults.
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model_choices().len(), 2);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut s = OracleSettings::default();
        s.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
