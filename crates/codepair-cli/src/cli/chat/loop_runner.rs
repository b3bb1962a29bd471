//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: provider construction, session
//! creation, welcome banner, greeting, the input loop with streamed
//! responses, slash commands, and the closing summary.

use std::io::Write;
use std::time::{Duration, Instant};

use console::style;
use crossterm::style::Color;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use codepair_core::chat::controller::TurnController;
use codepair_core::chat::session::ChatSession;
use codepair_infra::llm::create_provider;
use codepair_types::chat::{MessageRole, Turn};
use codepair_types::config::OracleSettings;
use codepair_types::error::ChatError;
use codepair_types::llm::LlmError;

use super::banner::{print_session_line, print_welcome_banner};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{ChatRenderer, preview};

/// How responses are delivered to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Print tokens as they arrive.
    Stream,
    /// Show the spinner until the full answer is in, then render it.
    Complete,
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat loop until the user exits.
pub async fn run_chat_loop(settings: OracleSettings, mode: ResponseMode) -> anyhow::Result<()> {
    let provider = create_provider(&settings)?;
    let controller = TurnController::new(provider, settings.clone());
    let mut session = ChatSession::new(settings.model.clone());

    info!(
        session = %session.id(),
        provider = controller.provider_name(),
        model = %settings.model,
        "Chat session started"
    );

    print_welcome_banner(&settings, &session.id().to_string());

    let renderer = ChatRenderer::new(Some(Color::Cyan));
    renderer.print_transcript(session.log());

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => chat_input.clear(),
                ChatCommand::Exit => break,
                ChatCommand::New => {
                    print_session_summary(&session);
                    session = ChatSession::new(settings.model.clone());
                    info!(session = %session.id(), "Started new session");
                    println!("\n  {}", style("New conversation.").dim());
                    print_session_line(&session.id().to_string());
                    renderer.print_transcript(session.log());
                }
                ChatCommand::History => renderer.print_transcript(session.log()),
                ChatCommand::Unknown(name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(name).dim()
                    );
                }
            }
            continue;
        }

        let start_time = Instant::now();
        let outcome = match mode {
            ResponseMode::Stream => {
                stream_reply(&controller, &mut session, &text, &renderer, &mut chat_input).await
            }
            ResponseMode::Complete => {
                let spinner = thinking_spinner();
                let result = controller.submit(&mut session, &text).await;
                spinner.finish_and_clear();
                if let Ok(ref turn) = result {
                    renderer.print_turn(turn);
                }
                result
            }
        };

        match outcome {
            Ok(_) => {
                let response_ms = start_time.elapsed().as_millis() as u64;
                if let Some(usage) = session.last_usage() {
                    renderer.print_stats_footer(usage, response_ms, session.model());
                }
                println!();
                session.mark_rendered();
            }
            Err(e) => report_error(&e, &text, &settings),
        }
    }

    chat_input.flush();
    print_session_summary(&session);
    println!("  {}", style("Session ended.").dim());
    Ok(())
}

/// Run one streaming cycle, printing tokens as they arrive.
///
/// Ctrl+C cancels the in-flight reply. The terminal is in raw mode while
/// the readline is alive, so Ctrl+C arrives as a readline event rather than
/// a signal; both are watched.
async fn stream_reply(
    controller: &TurnController,
    session: &mut ChatSession,
    text: &str,
    renderer: &ChatRenderer,
    chat_input: &mut ChatInput,
) -> Result<Turn, ChatError> {
    let spinner = thinking_spinner();
    let cancel = CancellationToken::new();
    let mut first_token = true;

    let cycle = controller.submit_streaming(session, text, &cancel, |delta| {
        if first_token {
            first_token = false;
            spinner.finish_and_clear();
            print!("\n  {}\n  ", ChatRenderer::role_label(MessageRole::Assistant));
            let _ = std::io::stdout().flush();
        }
        renderer.print_streaming_token(&delta.replace('\n', "\n  "));
    });
    tokio::pin!(cycle);

    let result = loop {
        tokio::select! {
            result = &mut cycle => break result,
            _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => cancel.cancel(),
            event = chat_input.read_line(), if !cancel.is_cancelled() => {
                match event {
                    InputEvent::Interrupted | InputEvent::Eof => cancel.cancel(),
                    InputEvent::Message(_) => {
                        debug!("Input ignored while a reply is in progress");
                    }
                }
            }
        }
    };

    spinner.finish_and_clear();
    println!();
    result
}

/// Print a failed cycle. The user turn stays in the log; nothing else changed.
fn report_error(error: &ChatError, text: &str, settings: &OracleSettings) {
    match error {
        ChatError::Validation(_) => {
            println!("  {}", style("Type a message to send it.").dim());
        }
        ChatError::Cancelled => {
            println!(
                "\n  {} Stopped. \"{}\" stays in the conversation.\n",
                style("■").yellow().bold(),
                style(preview(text, 40)).dim()
            );
        }
        ChatError::Oracle(e) => {
            eprintln!("\n  {} {e}", style("!").red().bold());
            if let Some(hint) = oracle_hint(e, settings) {
                eprintln!("  {}", style(hint).dim());
            }
            eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
            println!();
        }
    }
}

/// A suggestion for the errors a local setup usually hits.
fn oracle_hint(error: &LlmError, settings: &OracleSettings) -> Option<String> {
    match error {
        LlmError::Connection { .. } => Some(format!(
            "Is the model server running at {}? Start it with `ollama serve`.",
            settings.endpoint()
        )),
        LlmError::ModelNotFound(_) => Some(format!(
            "Download the model with `ollama pull {}`.",
            settings.model
        )),
        LlmError::EmptyResponse => Some("The model returned no text.".to_string()),
        _ => None,
    }
}

fn print_session_summary(session: &ChatSession) {
    if session.exchange_count() == 0 {
        return;
    }
    let usage = session.total_usage();
    println!(
        "\n  {} {} exchanges {} {} tokens in {} tokens out",
        style("|").dim(),
        style(session.exchange_count()).dim(),
        style("\u{00b7}").dim(),
        style(usage.input_tokens).dim(),
        style(usage.output_tokens).dim(),
    );
}
