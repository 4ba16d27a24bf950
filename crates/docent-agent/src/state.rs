//! Per-turn conversation state

use std::collections::BTreeSet;

use docent_ai::Message;
use serde::{Deserialize, Serialize};

use crate::schema::{ConversationTurn, Intent, StructuredResponse};

/// Append-only message log
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenate messages onto the log
    pub fn append(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    /// The last `n` messages, oldest first
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Where the workflow goes next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "qa_agent")]
    Qa,
    #[serde(rename = "summarization_agent")]
    Summarization,
    #[serde(rename = "calculation_agent")]
    Calculation,
    #[serde(rename = "update_memory")]
    UpdateMemory,
    #[serde(rename = "end")]
    End,
}

impl Route {
    pub fn label(&self) -> &'static str {
        match self {
            Route::Qa => "qa_agent",
            Route::Summarization => "summarization_agent",
            Route::Calculation => "calculation_agent",
            Route::UpdateMemory => "update_memory",
            Route::End => "end",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything one turn reads and writes. Owned by the in-flight turn.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: MessageLog,
    pub user_input: String,
    pub intent: Option<Intent>,
    pub next_route: Option<Route>,
    pub conversation_history: Vec<ConversationTurn>,
    pub conversation_summary: String,
    pub active_documents: BTreeSet<String>,
    pub current_response: Option<StructuredResponse>,
    pub tools_used: Vec<String>,
    pub session_id: String,
    pub user_id: String,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Reset the per-turn fields and set the new input
    pub fn begin_turn(&mut self, user_input: impl Into<String>) {
        self.user_input = user_input.into();
        self.intent = None;
        self.next_route = None;
        self.current_response = None;
        self.tools_used.clear();
    }
}
