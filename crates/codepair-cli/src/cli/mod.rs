//! CLI command definitions for the `codepair` binary.
//!
//! Uses clap derive macros for argument parsing. Running `codepair` with no
//! subcommand starts a chat session.

pub mod chat;
pub mod models;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use codepair_infra::config::SettingsOverrides;
use codepair_types::llm::{OutputFormat, ProviderType};

/// Pair-program with a local coding model from your terminal.
#[derive(Parser)]
#[command(name = "codepair", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write log events as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub oracle: OracleArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings for the completion oracle. Each one overrides `config.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct OracleArgs {
    /// Model to chat with (e.g. deepseek-r1:1.5b).
    #[arg(long, global = true, env = "CODEPAIR_MODEL")]
    pub model: Option<String>,

    /// Model server base URL.
    #[arg(long, global = true, env = "CODEPAIR_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Sampling temperature (0.0 - 2.0).
    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    /// Output format hint: text or json.
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Server protocol: ollama or openai_compatible.
    #[arg(long, global = true)]
    pub provider: Option<ProviderType>,
}

impl OracleArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            provider: self.provider,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            format: self.format,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (the default).
    Chat(ChatArgs),

    /// List the models you can chat with.
    Models {
        /// Send a short probe to the configured model.
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ChatArgs {
    /// Wait for the whole response instead of streaming tokens.
    #[arg(long)]
    pub no_stream: bool,
}
