//! OpenAI Chat Completions engine
//!
//! Works against any OpenAI-compatible endpoint (OpenAI, Groq, OpenRouter,
//! Ollama, ...). Tool calling uses `tools`; structured output uses
//! `response_format: json_schema`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RetryConfig;
use crate::{
    engine::ReasoningEngine,
    error::{Error, Result},
    types::{AssistantMetadata, Content, Context, Message, OutputSchema, StopReason, Usage},
};

/// Default endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model settings for an [`OpenAIEngine`]
#[derive(Debug, Clone)]
pub struct EngineModel {
    /// Model identifier, e.g. `gpt-4o-mini`
    pub id: String,
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    /// Maximum tokens per response
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl EngineModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
            temperature: Some(0.0),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// OpenAI-compatible reasoning engine
pub struct OpenAIEngine {
    client: reqwest::Client,
    api_key: Option<String>,
    model: EngineModel,
    retry_config: RetryConfig,
}

impl OpenAIEngine {
    /// Create a new engine with an API key
    pub fn new(api_key: impl Into<String>, model: EngineModel) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key.into()),
            model,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create an engine for a local endpoint that needs no key
    pub fn without_key(model: EngineModel) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
            model,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn model(&self) -> &EngineModel {
        &self.model
    }

    fn build_request(
        &self,
        context: &Context,
        response_format: Option<ResponseFormat>,
    ) -> Result<ChatRequest> {
        if self.model.id.trim().is_empty() {
            return Err(Error::InvalidConfig("model id is empty".to_string()));
        }

        let mut messages = Vec::new();

        if let Some(ref system_prompt) = context.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(system_prompt.clone()),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for msg in &context.messages {
            messages.push(convert_message(msg));
        }

        let tools = if context.tools.is_empty() {
            None
        } else {
            Some(
                context
                    .tools
                    .iter()
                    .map(|t| ChatTool {
                        tool_type: "function".to_string(),
                        function: ChatFunction {
                            name: t.name.clone(),
                            description: Some(t.description.clone()),
                            parameters: Some(t.parameters.clone()),
                        },
                    })
                    .collect(),
            )
        };

        let has_tools = tools.is_some();
        Ok(ChatRequest {
            model: self.model.id.clone(),
            messages,
            max_tokens: self.model.max_tokens,
            temperature: self.model.temperature,
            tools,
            tool_choice: if has_tools {
                Some(serde_json::json!("auto"))
            } else {
                None
            },
            response_format,
        })
    }

    /// Send a request, retrying transient failures
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut attempt = 0u32;
        loop {
            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retry_config.max_retries => {
                    let delay = self.retry_config.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        self.retry_config.max_retries + 1,
                        e,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.model.base_url);
        tracing::debug!("Chat completions URL: {}", url);

        let mut builder = self.client.post(&url).json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Error::RateLimited { retry_after });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidApiKey);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => Error::api(
                    envelope.error.error_type.unwrap_or_else(|| status.to_string()),
                    envelope.error.message,
                ),
                Err(_) => Error::api(status.to_string(), text),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    async fn respond_with_tools(&self, context: &Context) -> Result<Message> {
        let request = self.build_request(context, None)?;
        let response = self.send(&request).await?;
        into_assistant_message(response, &self.model.id)
    }

    async fn respond_structured(
        &self,
        context: &Context,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value> {
        let format = ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: schema.name.clone(),
                schema: schema.schema.clone(),
                strict: false,
            },
        };
        let mut context = context.clone();
        context.tools.clear();
        let request = self.build_request(&context, Some(format))?;
        let response = self.send(&request).await?;
        let message = into_assistant_message(response, &self.model.id)?;
        parse_structured_text(&message.text())
    }
}

/// Parse the JSON body of a structured response, tolerating code fences
fn parse_structured_text(text: &str) -> Result<serde_json::Value> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    if body.is_empty() {
        return Err(Error::UnexpectedResponse(
            "structured response was empty".to_string(),
        ));
    }
    Ok(serde_json::from_str(body)?)
}

fn into_assistant_message(response: ChatResponse, model_id: &str) -> Result<Message> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("response had no choices".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(Content::text(text));
    }
    for tc in choice.message.tool_calls.unwrap_or_default() {
        let arguments = if tc.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&tc.function.arguments).map_err(|e| {
                Error::UnexpectedResponse(format!(
                    "tool call '{}' had invalid arguments: {}",
                    tc.function.name, e
                ))
            })?
        };
        content.push(Content::tool_call(
            tc.id.unwrap_or_default(),
            tc.function.name,
            arguments,
        ));
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("stop") => Some(StopReason::Stop),
        Some("length") => Some(StopReason::Length),
        Some("tool_calls") => Some(StopReason::ToolUse),
        _ => None,
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input: u.prompt_tokens,
            output: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(Message::Assistant {
        content,
        metadata: AssistantMetadata {
            model: Some(model_id.to_string()),
            usage,
            stop_reason,
            timestamp: chrono::Utc::now().timestamp_millis(),
        },
    })
}

fn convert_message(msg: &Message) -> ChatMessage {
    match msg {
        Message::User { .. } => ChatMessage {
            role: "user".to_string(),
            content: Some(msg.text()),
            tool_calls: None,
            tool_call_id: None,
        },
        Message::Assistant { content, .. } => {
            let tool_calls: Vec<ChatToolCall> = content
                .iter()
                .filter_map(|c| match c {
                    Content::ToolCall {
                        id,
                        name,
                        arguments,
                    } => Some(ChatToolCall {
                        id: if id.is_empty() { name.clone() } else { id.clone() },
                        call_type: "function".to_string(),
                        function: ChatFunctionCall {
                            name: name.clone(),
                            arguments: serde_json::to_string(arguments).unwrap_or_default(),
                        },
                    }),
                    _ => None,
                })
                .collect();
            let text = msg.text();

            ChatMessage {
                role: "assistant".to_string(),
                content: if text.is_empty() { None } else { Some(text) },
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }
        }
        Message::ToolResult { tool_call_id, .. } => ChatMessage {
            role: "tool".to_string(),
            content: Some(msg.text()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.clone()),
        },
    }
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: serde_json::Value,
    strict: bool,
}

// Response types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseToolCall {
    id: Option<String>,
    function: ChatResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ChatResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
