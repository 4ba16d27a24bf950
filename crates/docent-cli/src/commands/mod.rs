//! Slash commands for interactive mode

mod docs;
mod session;

pub use docs::DocsCommand;
pub use session::SessionCommand;

use crate::tools::DocumentStore;
use docent_agent::Assistant;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a fresh session
    NewSession,
    /// Show a message to the user (not sent to the assistant)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// What a command may look at
pub struct CommandContext<'a> {
    pub assistant: &'a Assistant,
    pub session_id: &'a str,
    pub store: &'a DocumentStore,
    pub model: &'a str,
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, ctx: &CommandContext<'_>) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let command = rest
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "quit" | "exit" | "q" => CommandResult::Exit,

        "new" | "n" | "clear" => CommandResult::NewSession,

        "session" | "s" => SessionCommand::execute(ctx.assistant, ctx.session_id, ctx.model),

        "docs" | "d" => DocsCommand::execute(ctx.assistant, ctx.session_id, ctx.store),

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /session, /s         Show session info
  /docs, /d            List documents referenced so far
  /new, /n             Start a new session
  /quit, /exit, /q     Exit docent

Ask anything else about the documents, for example:
  What is the total amount in invoice INV-001?
  Summarize all contracts
  Calculate the sum of all invoice totals"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_agent::{AssistantConfig, ToolRegistry, Workflow};
    use docent_ai::providers::{EngineModel, OpenAIEngine};
    use std::sync::Arc;

    fn assistant() -> Assistant {
        let engine = OpenAIEngine::without_key(EngineModel::new("test-model"));
        let workflow = Workflow::standard(
            Arc::new(engine),
            Arc::new(ToolRegistry::default()),
            AssistantConfig::default(),
        )
        .unwrap();
        Assistant::new(Arc::new(workflow))
    }

    fn run(input: &str, assistant: &Assistant, session_id: &str) -> Option<CommandResult> {
        let store = DocumentStore::sample().unwrap();
        let ctx = CommandContext {
            assistant,
            session_id,
            store: &store,
            model: "test-model",
        };
        execute_command(input, &ctx)
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        let assistant = assistant();
        assert_eq!(run("Summarize all contracts", &assistant, "x"), None);
    }

    #[test]
    fn test_basic_commands() {
        let assistant = assistant();
        assert_eq!(run("/quit", &assistant, "x"), Some(CommandResult::Exit));
        assert_eq!(run("  /NEW ", &assistant, "x"), Some(CommandResult::NewSession));
        assert_eq!(
            run("/frobnicate now", &assistant, "x"),
            Some(CommandResult::Unknown("frobnicate".into()))
        );
        assert!(matches!(run("/help", &assistant, "x"), Some(CommandResult::Message(m)) if m.contains("/docs")));
    }

    #[test]
    fn test_session_command() {
        let assistant = assistant();
        let session_id = assistant.start_session("analyst");
        match run("/session", &assistant, &session_id) {
            Some(CommandResult::Message(text)) => {
                assert!(text.contains("User:       analyst"));
                assert!(text.contains("Turns:      0"));
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_docs_command_empty() {
        let assistant = assistant();
        let session_id = assistant.start_session("analyst");
        match run("/docs", &assistant, &session_id) {
            Some(CommandResult::Message(text)) => {
                assert!(text.contains("No documents referenced yet (8 in the collection)"))
            }
            other => panic!("expected message, got {:?}", other),
        }
    }
}
