//! Single-pass tool invocation
//!
//! The engine is offered every registered tool once. Whatever calls it asks
//! for run in order, and their results are folded into the message sequence.
//! The engine never sees those results in another tool round.

use std::time::Duration;

use docent_ai::{Content, Context, Message, ReasoningEngine, ToolCall};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::call::with_timeout;
use crate::error::Result;
use crate::events::WorkflowEvent;
use crate::tool::ToolRegistry;

/// Name of the tool whose missing `query` argument gets synthesized
pub const SEARCH_TOOL: &str = "document_search";

/// Name of the tool whose output feeds calculation reconciliation
pub const CALCULATOR_TOOL: &str = "calculator";

/// One executed tool call
#[derive(Debug, Clone)]
pub struct ToolExecution {
    pub name: String,
    /// Arguments as executed, after query synthesis
    pub arguments: serde_json::Value,
    pub output: String,
    pub is_error: bool,
}

/// Everything a tool round produced
#[derive(Debug, Clone, Default)]
pub struct ToolRound {
    /// The engine's reply followed by one result message per executed call
    pub messages: Vec<Message>,
    pub executions: Vec<ToolExecution>,
    /// Executed tool names in order, duplicates kept
    pub tools_used: Vec<String>,
}

impl ToolRound {
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.executions.iter().map(|e| e.output.as_str())
    }

    pub fn executions_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ToolExecution> {
        self.executions.iter().filter(move |e| e.name == name)
    }
}

/// Settings for one round
pub struct RoundOptions<'a> {
    /// Substituted for an absent `document_search` query
    pub default_query: &'a str,
    pub engine_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub events: &'a broadcast::Sender<WorkflowEvent>,
}

/// Fill in `query` when the call omits it or passes null
pub fn synthesize_query(call: &mut ToolCall, default_query: &str) {
    if call.name != SEARCH_TOOL {
        return;
    }
    if !call.arguments.is_object() {
        call.arguments = serde_json::json!({});
    }
    if let Some(args) = call.arguments.as_object_mut() {
        let absent = args.get("query").is_none_or(|q| q.is_null());
        if absent {
            args.insert(
                "query".to_string(),
                serde_json::Value::String(default_query.to_string()),
            );
        }
    }
}

/// Offer the registry, run the requested calls, return what happened
pub async fn run_tool_round(
    engine: &dyn ReasoningEngine,
    registry: &ToolRegistry,
    mut context: Context,
    options: RoundOptions<'_>,
) -> Result<ToolRound> {
    context.tools = registry.definitions();

    let response = with_timeout(options.engine_timeout, "tool selection", async {
        Ok(engine.respond_with_tools(&context).await?)
    })
    .await?;

    let calls = response.tool_calls();
    debug!(calls = calls.len(), "Engine requested tool calls");

    let mut round = ToolRound::default();
    let mut answered = Vec::new();
    let mut results = Vec::new();
    let cancel = CancellationToken::new();

    for mut call in calls {
        synthesize_query(&mut call, options.default_query);

        let Some(tool) = registry.find(&call.name) else {
            debug!(tool = %call.name, "Skipping unregistered tool");
            let _ = options.events.send(WorkflowEvent::ToolSkipped {
                tool_name: call.name.clone(),
            });
            continue;
        };

        registry.validate(&call.name, &call.arguments)?;

        let call_id = if call.id.is_empty() {
            call.name.clone()
        } else {
            call.id.clone()
        };

        let _ = options.events.send(WorkflowEvent::ToolExecutionStart {
            tool_call_id: call_id.clone(),
            tool_name: call.name.clone(),
            arguments: call.arguments.clone(),
        });
        debug!(tool = %call.name, id = %call_id, "Executing tool");

        let result = with_timeout(
            options.tool_timeout,
            &format!("tool '{}'", call.name),
            tool.execute(&call_id, call.arguments.clone(), cancel.child_token()),
        )
        .await;
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                cancel.cancel();
                return Err(e);
            }
        };

        let output = result.text_content();
        let _ = options.events.send(WorkflowEvent::ToolExecutionEnd {
            tool_call_id: call_id.clone(),
            tool_name: call.name.clone(),
            result: output.clone(),
            is_error: result.is_error,
        });

        results.push(Message::tool_result(
            &call_id,
            &call.name,
            output.clone(),
            result.is_error,
        ));
        round.tools_used.push(call.name.clone());
        round.executions.push(ToolExecution {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            output,
            is_error: result.is_error,
        });
        answered.push(ToolCall {
            id: call_id,
            ..call
        });
    }

    round.messages.push(answered_reply(response, &answered));
    round.messages.extend(results);
    Ok(round)
}

/// The engine's reply with its tool calls narrowed to the ones that ran,
/// under the ids their result messages carry. Every call left in it is
/// answered by exactly one result message.
fn answered_reply(response: Message, answered: &[ToolCall]) -> Message {
    match response {
        Message::Assistant { content, metadata } => {
            let mut content: Vec<Content> =
                content.into_iter().filter(|c| !c.is_tool_call()).collect();
            content.extend(
                answered
                    .iter()
                    .map(|call| Content::tool_call(&call.id, &call.name, call.arguments.clone())),
            );
            Message::Assistant { content, metadata }
        }
        other => other,
    }
}
