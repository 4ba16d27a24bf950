//! Tool trait and registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use docent_ai::{Content, ToolDefinition};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content handed back to the engine
    pub content: Vec<Content>,
    /// The tool ran but reports a problem (e.g. no such document)
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    /// Create an error-flagged result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
        }
    }

    /// Get the text content as a single string
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trait for executable tools
///
/// Returning `Ok` with an error-flagged [`ToolResult`] is an ordinary
/// outcome the engine gets to see. Returning `Err` aborts the turn.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in API calls)
    fn name(&self) -> &str;

    /// Tool description for the engine
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments
    async fn execute(
        &self,
        tool_call_id: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> Result<ToolResult>;
}

/// Type alias for a shared tool
pub type BoxedTool = Arc<dyn Tool>;

/// Convert a Tool to a definition offered to the engine
pub fn to_definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition::new(tool.name(), tool.description(), tool.parameters_schema())
}

/// Tools available to every task, with argument validators compiled once
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<BoxedTool>,
    validators: HashMap<String, Arc<jsonschema::Validator>>,
}

impl ToolRegistry {
    pub fn new(tools: impl IntoIterator<Item = BoxedTool>) -> Self {
        let mut registry = Self::default();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: BoxedTool) {
        let name = tool.name().to_string();
        if let Some(pos) = self.tools.iter().position(|t| t.name() == name) {
            tracing::warn!("Replacing registered tool '{}'", name);
            self.tools.remove(pos);
        }

        let schema = tool.parameters_schema();
        match jsonschema::validator_for(&schema) {
            Ok(validator) => {
                self.validators.insert(name, Arc::new(validator));
            }
            Err(e) => {
                self.validators.remove(&name);
                tracing::warn!(
                    "Invalid tool parameter schema for '{}', skipping validation: {}",
                    name,
                    e
                );
            }
        }
        self.tools.push(tool);
    }

    /// Resolve a tool by exact name
    pub fn find(&self, name: &str) -> Option<&BoxedTool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Definitions of every registered tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| to_definition(t.as_ref())).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check arguments against the tool's parameter schema
    pub fn validate(&self, name: &str, arguments: &serde_json::Value) -> Result<()> {
        let Some(validator) = self.validators.get(name) else {
            return Ok(());
        };
        let errors: Vec<String> = validator
            .iter_errors(arguments)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::tool(
                name,
                format!("argument validation failed: {}", errors.join("; ")),
            ))
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            _tool_call_id: &str,
            arguments: serde_json::Value,
            _cancel: CancellationToken,
        ) -> Result<ToolResult> {
            let text = arguments
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or("(empty)");
            Ok(ToolResult::text(text))
        }
    }

    #[tokio::test]
    async fn test_execute_echo() {
        let result = EchoTool
            .execute(
                "call_1",
                serde_json::json!({"text": "hello"}),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.text_content(), "hello");
    }

    #[test]
    fn test_tool_result_error() {
        let r = ToolResult::error("bad");
        assert!(r.is_error);
        assert_eq!(r.text_content(), "bad");
    }

    #[test]
    fn test_registry_find_exact_name() {
        let registry = ToolRegistry::new([Arc::new(EchoTool) as BoxedTool]);
        assert!(registry.find("echo").is_some());
        assert!(registry.find("Echo").is_none());
        assert!(registry.find("echo ").is_none());
    }

    #[test]
    fn test_registry_definitions() {
        let registry = ToolRegistry::new([Arc::new(EchoTool) as BoxedTool]);
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].description, "Echoes input");
    }

    #[test]
    fn test_registry_replaces_duplicate() {
        let registry = ToolRegistry::new([
            Arc::new(EchoTool) as BoxedTool,
            Arc::new(EchoTool) as BoxedTool,
        ]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_validate_arguments() {
        let registry = ToolRegistry::new([Arc::new(EchoTool) as BoxedTool]);
        assert!(registry.validate("echo", &serde_json::json!({"text": "x"})).is_ok());

        let err = registry
            .validate("echo", &serde_json::json!({"text": 5}))
            .unwrap_err();
        match err {
            Error::ToolExecution { tool, message } => {
                assert_eq!(tool, "echo");
                assert!(message.contains("/text"), "got: {}", message);
            }
            other => panic!("expected ToolExecution, got {:?}", other),
        }

        assert!(registry.validate("echo", &serde_json::json!({})).is_err());
    }

    #[test]
    fn test_validate_unknown_tool_passes() {
        let registry = ToolRegistry::default();
        assert!(registry.validate("nope", &serde_json::json!(1)).is_ok());
    }
}
