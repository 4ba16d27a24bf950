//! /docs command - list documents referenced in this session

use super::CommandResult;
use crate::tools::DocumentStore;
use docent_agent::Assistant;

pub struct DocsCommand;

impl DocsCommand {
    pub fn execute(assistant: &Assistant, session_id: &str, store: &DocumentStore) -> CommandResult {
        let snapshot = match assistant.session(session_id) {
            Ok(snapshot) => snapshot,
            Err(e) => return CommandResult::Message(format!("Session unavailable: {}", e)),
        };

        if snapshot.active_documents.is_empty() {
            return CommandResult::Message(format!(
                "No documents referenced yet ({} in the collection).",
                store.len()
            ));
        }

        let mut output = String::from("Referenced documents:\n");
        for id in &snapshot.active_documents {
            match store.get(id) {
                Some(doc) => output.push_str(&format!("  {:<10} {} ({})\n", id, doc.title, doc.doc_type)),
                None => output.push_str(&format!("  {:<10} (not in collection)\n", id)),
            }
        }
        CommandResult::Message(output.trim_end().to_string())
    }
}
