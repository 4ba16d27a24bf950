//! docent-agent: Document assistant orchestration
//!
//! Routes each user message through intent classification to one task
//! handler (question answering, summarization or calculation), runs a single
//! round of tool calls, reconciles the structured response with what the
//! tools returned, and folds the turn into conversation memory.

pub mod call;
pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod memory;
pub mod prompts;
pub mod reconcile;
pub mod schema;
pub mod session;
pub mod state;
pub mod task;
pub mod tool;
pub mod tool_loop;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AssistantConfig, SummaryConfig};
pub use error::{Error, Result};
pub use events::WorkflowEvent;
pub use schema::{
    AnswerResponse, CalculationResponse, ConversationTurn, Intent, IntentType,
    StructuredResponse, SummarizationResponse,
};
pub use session::{Assistant, SessionSnapshot, TurnOutcome};
pub use state::{ConversationState, MessageLog, Route};
pub use tool::{BoxedTool, Tool, ToolRegistry, ToolResult};
pub use workflow::{Workflow, WorkflowBuilder};
