//! Welcome banner display for chat sessions.
//!
//! Prints a styled banner when a chat session starts, showing the title,
//! model capabilities, the oracle settings and the session id.

use console::style;

use codepair_types::config::OracleSettings;

pub const TITLE: &str = "DeepSeek Code Collaborator";
pub const TAGLINE: &str = "Your AI Pair Programmer with Debugging Superpowers";

/// What the default model is good at, shown under the title.
pub const CAPABILITIES: [&str; 4] = [
    "Python Expert",
    "Debugging Assistant",
    "Code Documentation",
    "Solution Design",
];

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(settings: &OracleSettings, session_id: &str) {
    println!();
    println!("  {} {}", "🧠", style(TITLE).cyan().bold());
    println!("  {}", style(format!("🚀 {TAGLINE}")).dim());
    println!();
    println!("  {}", style(CAPABILITIES.join(" · ")).dim());
    println!();
    println!("  {}     {}", style("Model:").bold(), style(&settings.model).dim());
    println!(
        "  {}    {} ({})",
        style("Server:").bold(),
        style(settings.endpoint()).dim(),
        style(settings.provider).dim()
    );
    print_session_line(session_id);
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+C to stop a reply, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

/// Print the short session id, used again when `/new` starts a session.
pub fn print_session_line(session_id: &str) {
    println!(
        "  {}   {}",
        style("Session:").bold(),
        style(short_id(session_id)).dim()
    );
}

/// First eight characters of a session id.
pub fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}
