//! The reasoning engine contract

use async_trait::async_trait;

use crate::{Context, Message, OutputSchema, Result};

/// Anything capable of free-text completion, tool calling and
/// schema-constrained structured output.
///
/// Implementations are shared across sessions behind an `Arc` and must not
/// keep per-conversation state.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Respond to `context`, optionally requesting calls to the tools it offers.
    ///
    /// Returns an assistant message whose content holds any text plus zero or
    /// more [`Content::ToolCall`](crate::Content::ToolCall) blocks.
    async fn respond_with_tools(&self, context: &Context) -> Result<Message>;

    /// Respond to `context` with a JSON value conforming to `schema`.
    async fn respond_structured(
        &self,
        context: &Context,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value>;

    /// Classify a fully rendered prompt against `schema`.
    async fn classify(&self, prompt: &str, schema: &OutputSchema) -> Result<serde_json::Value> {
        self.respond_structured(&Context::from_prompt(prompt), schema)
            .await
    }

    /// Free-text completion without tools.
    async fn complete(&self, context: &Context) -> Result<String> {
        let mut context = context.clone();
        context.tools.clear();
        Ok(self.respond_with_tools(&context).await?.text())
    }
}
