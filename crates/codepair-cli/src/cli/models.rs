//! `codepair models`: the model picker.
//!
//! Lists the models named in `config.toml` (or the default model) and,
//! when the server speaks the native Ollama API, the models installed on it.

use std::time::Duration;

use console::style;
use serde::Serialize;

use codepair_infra::llm::ollama::OllamaProvider;
use codepair_infra::llm::{check_connection, create_provider};
use codepair_types::config::{FileConfig, OracleSettings};
use codepair_types::llm::ProviderType;

/// Timeout for the model listing request; the server is local.
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ModelEntry {
    name: String,
    configured: bool,
    installed: Option<bool>,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct ModelsReport {
    endpoint: String,
    server_reachable: Option<bool>,
    models: Vec<ModelEntry>,
    check: Option<CheckResult>,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    model: String,
    ok: bool,
    error: Option<String>,
}

/// Merge configured and installed model names, configured first.
fn merge_models(
    configured: &[String],
    installed: Option<&[String]>,
    selected: &str,
) -> Vec<ModelEntry> {
    let mut entries: Vec<ModelEntry> = configured
        .iter()
        .map(|name| ModelEntry {
            name: name.clone(),
            configured: true,
            installed: installed.map(|names| names.contains(name)),
            selected: name == selected,
        })
        .collect();

    if let Some(names) = installed {
        for name in names {
            if !configured.contains(name) {
                entries.push(ModelEntry {
                    name: name.clone(),
                    configured: false,
                    installed: Some(true),
                    selected: name == selected,
                });
            }
        }
    }

    entries
}

pub async fn list_models(
    file: &FileConfig,
    settings: &OracleSettings,
    check: bool,
    json: bool,
) -> anyhow::Result<()> {
    let installed = match settings.provider {
        ProviderType::Ollama => {
            let ollama = OllamaProvider::new(settings.endpoint(), &settings.model, TAGS_TIMEOUT)?;
            match ollama.list_models().await {
                Ok(tags) => Some(tags.into_iter().map(|t| t.name).collect::<Vec<_>>()),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not list installed models");
                    None
                }
            }
        }
        ProviderType::OpenAiCompatible => None,
    };

    let check = if check {
        let provider = create_provider(settings)?;
        let result = check_connection(&provider, settings).await;
        Some(CheckResult {
            model: settings.model.clone(),
            ok: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        })
    } else {
        None
    };

    let report = ModelsReport {
        endpoint: settings.endpoint().to_string(),
        server_reachable: match settings.provider {
            ProviderType::Ollama => Some(installed.is_some()),
            ProviderType::OpenAiCompatible => None,
        },
        models: merge_models(&file.model_choices(), installed.as_deref(), &settings.model),
        check,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &ModelsReport) {
    println!();
    println!(
        "  {} {}",
        style("Models at").bold(),
        style(&report.endpoint).cyan()
    );
    if report.server_reachable == Some(false) {
        println!("  {}", style("Server not reachable; showing configured models only.").yellow());
    }
    println!();

    for entry in &report.models {
        let marker = if entry.selected {
            format!("{}", style("*").green().bold())
        } else {
            " ".to_string()
        };
        let status = match (entry.configured, entry.installed) {
            (_, Some(false)) => format!("{}", style("not installed").yellow()),
            (true, _) => format!("{}", style("configured").dim()),
            (false, _) => format!("{}", style("installed").dim()),
        };
        println!("  {marker} {:<32} {status}", entry.name);
    }

    if let Some(ref check) = report.check {
        println!();
        if check.ok {
            println!("  {} {} answered", style("✓").green(), check.model);
        } else {
            println!(
                "  {} {}: {}",
                style("✗").red(),
                check.model,
                check.error.as_deref().unwrap_or("failed")
            );
        }
    }
    println!();
}
