//! Error types for docent-agent

use thiserror::Error;

/// Result type alias using docent-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a turn
///
/// Unresolvable tool names and fields missing from structured output are
/// not errors; they are skipped and reconciled respectively.
#[derive(Error, Debug)]
pub enum Error {
    /// The intent could not be obtained or was invalid
    #[error("Intent classification failed: {0}")]
    Classification(String),

    /// A resolved tool failed while executing, or its arguments were invalid
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// An error from the reasoning engine
    #[error(transparent)]
    Engine(#[from] docent_ai::Error),

    /// The engine returned output that does not fit the requested schema
    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),

    /// An engine or tool call did not finish in time
    #[error("Timed out waiting for {operation}")]
    Timeout { operation: String },

    /// No session with this id
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// A prompt template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// The workflow graph is malformed
    #[error("Invalid workflow graph: {0}")]
    InvalidGraph(String),
}

impl Error {
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from the reasoning engine (including timeouts)
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Error::Engine(_) | Error::MalformedOutput(_) | Error::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let e = Error::tool("calculator", "division by zero");
        assert_eq!(e.to_string(), "Tool 'calculator' failed: division by zero");
    }

    #[test]
    fn test_engine_failure_classification() {
        assert!(Error::Engine(docent_ai::Error::InvalidApiKey).is_engine_failure());
        assert!(
            Error::Timeout {
                operation: "engine".into()
            }
            .is_engine_failure()
        );
        assert!(!Error::Classification("bad".into()).is_engine_failure());
        assert!(!Error::tool("t", "m").is_engine_failure());
    }
}
