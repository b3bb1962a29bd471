//! Configuration loader for codepair.
//!
//! Reads `config.toml` (by default `~/.config/codepair/config.toml`) into a
//! [`FileConfig`] and resolves the final [`OracleSettings`] from defaults,
//! the file, and command-line overrides. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use codepair_types::config::{FileConfig, OracleSettings};
use codepair_types::error::ConfigError;
use codepair_types::llm::{OutputFormat, ProviderType};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default location of `config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codepair").join(CONFIG_FILE_NAME))
}

/// Load `config.toml` from `path`.
///
/// - If the file does not exist, returns [`FileConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_file_config(path: &Path) -> FileConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return FileConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return FileConfig::default();
        }
    };

    match parse_file_config(path, &content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            FileConfig::default()
        }
    }
}

/// Parse the text of a `config.toml`.
pub fn parse_file_config(path: &Path, content: &str) -> Result<FileConfig, ConfigError> {
    toml::from_str::<FileConfig>(content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.message().to_string(),
    })
}

/// Values given on the command line or through the environment.
///
/// Each present field wins over the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub provider: Option<ProviderType>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub format: Option<OutputFormat>,
}

/// Resolve the oracle settings: defaults, then the file, then overrides.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the merged settings fail validation.
pub fn resolve_settings(
    file: &FileConfig,
    overrides: &SettingsOverrides,
) -> Result<OracleSettings, ConfigError> {
    let mut settings = OracleSettings::default();
    file.apply_to(&mut settings);

    if let Some(provider) = overrides.provider {
        settings.provider = provider;
    }
    if let Some(ref model) = overrides.model {
        settings.model = model.clone();
    }
    if let Some(ref base_url) = overrides.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(temperature) = overrides.temperature {
        settings.temperature = temperature;
    }
    if let Some(format) = overrides.format {
        settings.format = format;
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_path_ends_with_codepair() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("codepair/config.toml"));
        }
    }

    #[tokio::test]
    async fn load_file_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_file_config(&tmp.path().join(CONFIG_FILE_NAME)).await;
        assert_eq!(config, FileConfig::default());
    }

    #[tokio::test]
    async fn load_file_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(
            &path,
            r#"
model = "deepseek-r1:7b"
base_url = "http://gpu-box:11434"
temperature = 0.7
format = "json"
models = ["deepseek-r1:1.5b", "deepseek-r1:7b"]
"#,
        )
        .await
        .unwrap();

        let config = load_file_config(&path).await;
        assert_eq!(config.model.as_deref(), Some("deepseek-r1:7b"));
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.models.len(), 2);
        assert!(config.provider.is_none());
    }

    #[tokio::test]
    async fn load_file_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_file_config(&path).await;
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn parse_file_config_reports_path() {
        let err = parse_file_config(Path::new("/etc/codepair.toml"), "temperature = \"hot\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "/etc/codepair.toml"));
    }

    #[test]
    fn resolve_settings_defaults() {
        let settings =
            resolve_settings(&FileConfig::default(), &SettingsOverrides::default()).unwrap();
        assert_eq!(settings, OracleSettings::default());
    }

    #[test]
    fn resolve_settings_overrides_beat_file() {
        let file = FileConfig {
            model: Some("deepseek-r1:7b".to_string()),
            temperature: Some(0.9),
            ..FileConfig::default()
        };
        let overrides = SettingsOverrides {
            model: Some("deepseek-r1:14b".to_string()),
            format: Some(OutputFormat::Json),
            ..SettingsOverrides::default()
        };

        let settings = resolve_settings(&file, &overrides).unwrap();
        assert_eq!(settings.model, "deepseek-r1:14b");
        assert!((settings.temperature - 0.9).abs() < f64::EPSILON);
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.base_url, "http://localhost:11434");
    }

    #[test]
    fn resolve_settings_rejects_invalid_result() {
        let overrides = SettingsOverrides {
            base_url: Some("localhost:11434".to_string()),
            ..SettingsOverrides::default()
        };
        let err = resolve_settings(&FileConfig::default(), &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "base_url"));
    }
}
