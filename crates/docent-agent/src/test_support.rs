//! Scripted engine and tools shared by the unit tests

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use docent_ai::{Content, Context, Message, OutputSchema, ReasoningEngine};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::tool::{BoxedTool, Tool, ToolResult};

/// An engine that replays queued responses and records what it was asked
#[derive(Default)]
pub struct MockEngine {
    tool_responses: Mutex<VecDeque<Message>>,
    structured: Mutex<VecDeque<docent_ai::Result<serde_json::Value>>>,
    completions: Mutex<VecDeque<docent_ai::Result<String>>>,
    /// Contexts passed to `respond_with_tools`
    pub tool_contexts: Mutex<Vec<Context>>,
    /// Contexts passed to `respond_structured`
    pub structured_contexts: Mutex<Vec<Context>>,
    schemas: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an assistant reply holding the given tool calls
    pub fn push_tool_calls(&self, calls: Vec<(&str, &str, serde_json::Value)>) {
        let content = calls
            .into_iter()
            .map(|(id, name, args)| Content::tool_call(id, name, args))
            .collect();
        self.tool_responses
            .lock()
            .push_back(Message::assistant_with_content(content));
    }

    pub fn push_structured(&self, value: serde_json::Value) {
        self.structured.lock().push_back(Ok(value));
    }

    pub fn push_structured_error(&self, error: docent_ai::Error) {
        self.structured.lock().push_back(Err(error));
    }

    pub fn push_completion(&self, text: &str) {
        self.completions.lock().push_back(Ok(text.to_string()));
    }

    pub fn push_completion_error(&self, error: docent_ai::Error) {
        self.completions.lock().push_back(Err(error));
    }

    /// Queue a classifier reply
    pub fn push_intent(&self, intent_type: &str, confidence: f64) {
        self.push_structured(serde_json::json!({
            "intent_type": intent_type,
            "confidence": confidence,
            "reasoning": "scripted"
        }));
    }

    pub fn schema_names(&self) -> Vec<String> {
        self.schemas.lock().clone()
    }

    pub fn last_tool_context(&self) -> Option<Context> {
        self.tool_contexts.lock().last().cloned()
    }
}

#[async_trait]
impl ReasoningEngine for MockEngine {
    async fn respond_with_tools(&self, context: &Context) -> docent_ai::Result<Message> {
        self.tool_contexts.lock().push(context.clone());
        Ok(self
            .tool_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Message::assistant("")))
    }

    async fn respond_structured(
        &self,
        context: &Context,
        schema: &OutputSchema,
    ) -> docent_ai::Result<serde_json::Value> {
        self.structured_contexts.lock().push(context.clone());
        self.schemas.lock().push(schema.name.clone());
        self.structured.lock().pop_front().unwrap_or_else(|| {
            Err(docent_ai::Error::UnexpectedResponse(
                "no structured response queued".into(),
            ))
        })
    }

    async fn complete(&self, _context: &Context) -> docent_ai::Result<String> {
        self.completions.lock().pop_front().unwrap_or_else(|| {
            Err(docent_ai::Error::UnexpectedResponse(
                "no completion queued".into(),
            ))
        })
    }
}

/// How a [`MockTool`] answers
#[derive(Clone)]
pub enum MockBehavior {
    Text(String),
    Flagged(String),
    Fail(String),
    /// Answer with the text after a pause
    Slow(std::time::Duration, String),
    Hang,
}

/// A tool that records its arguments and answers as scripted
pub struct MockTool {
    name: String,
    behavior: MockBehavior,
    schema: serde_json::Value,
    pub calls: Mutex<Vec<serde_json::Value>>,
}

impl MockTool {
    pub fn new(name: &str, behavior: MockBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            schema: serde_json::json!({"type": "object"}),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn text(name: &str, output: &str) -> Arc<Self> {
        Arc::new(Self::new(name, MockBehavior::Text(output.to_string())))
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = schema;
        self
    }

    pub fn recorded(&self) -> Vec<serde_json::Value> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        arguments: serde_json::Value,
        _cancel: CancellationToken,
    ) -> Result<ToolResult> {
        self.calls.lock().push(arguments);
        match &self.behavior {
            MockBehavior::Text(text) => Ok(ToolResult::text(text.clone())),
            MockBehavior::Flagged(text) => Ok(ToolResult::error(text.clone())),
            MockBehavior::Fail(message) => Err(Error::tool(&self.name, message.clone())),
            MockBehavior::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(ToolResult::text(text.clone()))
            }
            MockBehavior::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                Ok(ToolResult::text(""))
            }
        }
    }
}

pub fn boxed(tool: &Arc<MockTool>) -> BoxedTool {
    tool.clone()
}
