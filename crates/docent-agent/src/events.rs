//! Workflow event types

use serde::{Deserialize, Serialize};

use crate::schema::IntentType;

/// Events emitted while a turn runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A message started processing
    TurnStart { session_id: String },

    /// The workflow entered a node
    NodeStart { node: String },

    /// The classifier produced an intent
    IntentClassified {
        intent_type: IntentType,
        confidence: f64,
        route: String,
    },

    /// Tool execution started
    ToolExecutionStart {
        tool_call_id: String,
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// Tool execution completed
    ToolExecutionEnd {
        tool_call_id: String,
        tool_name: String,
        result: String,
        is_error: bool,
    },

    /// The engine asked for a tool that is not registered
    ToolSkipped { tool_name: String },

    /// The turn committed
    TurnEnd {
        session_id: String,
        tools_used: Vec<String>,
    },

    /// The turn aborted
    Error { message: String },
}

impl WorkflowEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowEvent::TurnEnd { .. } | WorkflowEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tag() {
        let event = WorkflowEvent::ToolSkipped {
            tool_name: "web_search".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_skipped");
        assert_eq!(value["tool_name"], "web_search");
    }

    #[test]
    fn test_terminal_events() {
        assert!(WorkflowEvent::Error { message: "x".into() }.is_terminal());
        assert!(
            !WorkflowEvent::NodeStart {
                node: "classify".into()
            }
            .is_terminal()
        );
    }
}
