//! /session command - show session info

use super::CommandResult;
use docent_agent::{Assistant, SessionSnapshot};

pub struct SessionCommand;

impl SessionCommand {
    pub fn execute(assistant: &Assistant, session_id: &str, model: &str) -> CommandResult {
        match assistant.session(session_id) {
            Ok(snapshot) => CommandResult::Message(Self::render(&snapshot, model)),
            Err(e) => CommandResult::Message(format!("Session unavailable: {}", e)),
        }
    }

    fn render(snapshot: &SessionSnapshot, model: &str) -> String {
        let mut output = String::from("Session Info\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Session:    {}\n", snapshot.session_id));
        output.push_str(&format!("User:       {}\n", snapshot.user_id));
        output.push_str(&format!("Model:      {}\n", model));
        output.push_str(&format!(
            "Started:    {}\n",
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output.push('\n');

        output.push_str(&format!("Turns:      {}\n", snapshot.turn_count));
        output.push_str(&format!("Messages:   {}\n", snapshot.message_count));
        output.push_str(&format!(
            "Documents:  {} referenced\n",
            snapshot.active_documents.len()
        ));

        if !snapshot.conversation_summary.is_empty() {
            output.push_str("\nSummary:\n");
            output.push_str(&snapshot.conversation_summary);
            output.push('\n');
        }
        output
    }
}
