//! Document reading tool

use async_trait::async_trait;
use docent_agent::tool::{Tool, ToolResult};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::store::{format_amount, DocumentStore};

/// Tool for reading a whole document by id
pub struct ReaderTool {
    store: Arc<DocumentStore>,
}

impl ReaderTool {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReaderTool {
    fn name(&self) -> &str {
        "document_reader"
    }

    fn description(&self) -> &str {
        "Read the full content of a document by its exact ID (for example INV-001)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "doc_id": {
                    "type": "string",
                    "description": "Exact document ID"
                }
            },
            "required": ["doc_id"]
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        arguments: serde_json::Value,
        cancel: CancellationToken,
    ) -> docent_agent::Result<ToolResult> {
        if cancel.is_cancelled() {
            return Ok(ToolResult::error("Operation cancelled"));
        }

        let Some(doc_id) = arguments.get("doc_id").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::error("Missing 'doc_id' argument"));
        };
        let Some(doc) = self.store.get(doc_id) else {
            return Ok(ToolResult::error(format!("Document not found: {}", doc_id)));
        };

        let mut output = format!("ID: {}\nTitle: {}\nType: {}\n", doc.id, doc.title, doc.doc_type);
        if let Some(date) = &doc.date {
            output.push_str(&format!("Date: {}\n", date));
        }
        if let Some(amount) = doc.amount {
            output.push_str(&format!("Amount: {}\n", format_amount(amount)));
        }
        if !doc.parties.is_empty() {
            output.push_str(&format!("Parties: {}\n", doc.parties.join(", ")));
        }
        output.push('\n');
        output.push_str(&doc.content);

        Ok(ToolResult::text(output))
    }
}
