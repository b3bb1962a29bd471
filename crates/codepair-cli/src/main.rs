//! codepair CLI entry point.
//!
//! Binary name: `codepair`
//!
//! Parses CLI arguments, initializes tracing, resolves the oracle settings
//! from flags, environment and `config.toml`, then dispatches to the chat
//! loop or the selected command.

mod cli;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::generate;

use codepair_infra::config::{default_config_path, load_file_config, resolve_settings};
use codepair_observe::tracing_setup::{
    TracingOptions, filter_directive, init_tracing, shutdown_tracing,
};
use codepair_types::config::FileConfig;

use cli::chat::loop_runner::{ResponseMode, run_chat_loop};
use cli::{ChatArgs, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        default_filter: filter_directive(cli.verbose, cli.quiet).to_string(),
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need configuration
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "codepair", &mut std::io::stdout());
        return Ok(());
    }

    let file = load_config(cli.config.clone()).await;
    let settings = resolve_settings(&file, &cli.oracle.overrides())?;
    tracing::debug!(
        provider = %settings.provider,
        model = %settings.model,
        endpoint = settings.endpoint(),
        temperature = settings.temperature,
        format = %settings.format,
        "Resolved oracle settings"
    );

    match cli.command {
        None => run_chat_loop(settings, ResponseMode::Stream).await?,
        Some(Commands::Chat(ChatArgs { no_stream })) => {
            let mode = if no_stream {
                ResponseMode::Complete
            } else {
                ResponseMode::Stream
            };
            run_chat_loop(settings, mode).await?;
        }
        Some(Commands::Models { check }) => {
            cli::models::list_models(&file, &settings, check, cli.json).await?;
        }
        Some(Commands::Completions { .. }) => {}
    }

    Ok(())
}

/// Read `config.toml` from `--config` or the platform config directory.
async fn load_config(explicit: Option<PathBuf>) -> FileConfig {
    match explicit.or_else(default_config_path) {
        Some(path) => load_file_config(&path).await,
        None => {
            tracing::debug!("No config directory on this platform, using defaults");
            FileConfig::default()
        }
    }
}
