//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the session.
//! Anything else typed at the prompt is a message for the model.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Drop the conversation and start over with the greeting.
    New,
    /// Print the whole conversation log.
    History,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` for anything that should go to the model: input not
/// starting with `/`, and text like `/etc/hosts is missing` whose first word
/// is not a command name. A lone `/word` that names no command is `Unknown`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut words = trimmed.split_whitespace();
    let cmd = words.next().unwrap_or(trimmed).to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" | "/reset" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        other if words.next().is_none() && is_command_name(other) => {
            Some(ChatCommand::Unknown(other.to_string()))
        }
        _ => None,
    }
}

fn is_command_name(word: &str) -> bool {
    word.strip_prefix('/')
        .is_some_and(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}    {}", style("/help").cyan(), "Show this help message");
    println!("  {}   {}", style("/clear").cyan(), "Clear the screen");
    println!("  {} {}", style("/history").cyan(), "Show the conversation so far");
    println!("  {}     {}", style("/new").cyan(), "Start a new conversation");
    println!("  {}    {}", style("/exit").cyan(), "End the chat session");
    println!();
    println!(
        "  {}",
        style("Ctrl+C stops a reply in progress, Ctrl+D exits").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/Q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_clear() {
        assert_eq!(parse("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse("/cls"), Some(ChatCommand::Clear));
    }

    #[test]
    fn test_parse_new_and_history() {
        assert_eq!(parse("  /new  "), Some(ChatCommand::New));
        assert_eq!(parse("/reset"), Some(ChatCommand::New));
        assert_eq!(parse("/history extra words"), Some(ChatCommand::History));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("print('/help')"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
        assert_eq!(parse("/hlep"), Some(ChatCommand::Unknown("/hlep".to_string())));
    }

    #[test]
    fn test_parse_paths_are_messages() {
        assert_eq!(parse("/etc/hosts won't parse"), None);
        assert_eq!(parse("/usr/bin/python3"), None);
        assert_eq!(parse("/foo why does this route 404?"), None);
    }
}
