//! Document search tool

use async_trait::async_trait;
use docent_agent::tool::{Tool, ToolResult};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::store::{format_amount, Comparison, Document, DocumentStore};
use crate::utils::truncate_chars;

const MAX_RESULTS: usize = 10;
const SNIPPET_CHARS: usize = 160;

/// Tool for finding documents by keyword, type or amount
pub struct SearchTool {
    store: Arc<DocumentStore>,
}

impl SearchTool {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

fn number_arg(arguments: &serde_json::Value, key: &str) -> Option<f64> {
    arguments.get(key).and_then(|v| v.as_f64())
}

fn render_results(description: &str, docs: &[&Document]) -> String {
    if docs.is_empty() {
        return format!("No documents found {}.", description);
    }
    let mut output = format!("Found {} document(s) {}:\n", docs.len(), description);
    for doc in docs.iter().take(MAX_RESULTS) {
        let amount = doc.amount.map(format_amount).unwrap_or_else(|| "n/a".into());
        output.push_str(&format!(
            "- ID: {} | {} | {} | {} | {}\n",
            doc.id,
            doc.title,
            doc.doc_type,
            doc.date.as_deref().unwrap_or("undated"),
            amount
        ));
        let snippet = truncate_chars(&doc.content.replace('\n', " "), SNIPPET_CHARS);
        output.push_str(&format!("  {}\n", snippet));
    }
    if docs.len() > MAX_RESULTS {
        output.push_str(&format!("... {} more not shown\n", docs.len() - MAX_RESULTS));
    }
    output
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "document_search"
    }

    fn description(&self) -> &str {
        "Search the document collection by keyword, document type (invoice, contract, claim) or amount. Results list each document as 'ID: <doc_id>'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms, or the document type for type searches"
                },
                "search_type": {
                    "type": "string",
                    "enum": ["keyword", "type", "amount", "amount_range"],
                    "description": "How to search (default: keyword)"
                },
                "comparison": {
                    "type": "string",
                    "enum": ["over", "under", "exact", "approximate"],
                    "description": "Amount comparison for amount searches"
                },
                "amount": {
                    "type": "number",
                    "description": "Amount to compare against"
                },
                "min_amount": {
                    "type": "number",
                    "description": "Lower bound for amount_range searches"
                },
                "max_amount": {
                    "type": "number",
                    "description": "Upper bound for amount_range searches"
                }
            },
            "required": ["query"]
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

        let query = match arguments.get("query").and_then(|v| v.as_str()) {
            Some(q) if !q.trim().is_empty() => q.trim(),
            _ => return Ok(ToolResult::error("The 'query' argument must be a non-empty string")),
        };
        let search_type = arguments
            .get("search_type")
            .and_then(|v| v.as_str())
            .unwrap_or("keyword");

        let output = match search_type {
            "keyword" => {
                let docs = self.store.search_keyword(query);
                render_results(&format!("matching '{}'", query), &docs)
            }
            "type" => {
                let docs = self.store.search_type(query);
                render_results(&format!("of type '{}'", query), &docs)
            }
            "amount" => {
                let comparison = arguments
                    .get("comparison")
                    .and_then(|v| v.as_str())
                    .and_then(Comparison::parse)
                    .unwrap_or(Comparison::Approximate);
                let Some(amount) = number_arg(&arguments, "amount") else {
                    return Ok(ToolResult::error("Amount searches need an 'amount' number"));
                };
                let docs = self.store.search_amount(comparison, amount);
                render_results(
                    &format!("with amount {:?} {}", comparison, format_amount(amount))
                        .to_lowercase(),
                    &docs,
                )
            }
            "amount_range" => {
                let min = number_arg(&arguments, "min_amount");
                let max = number_arg(&arguments, "max_amount");
                if min.is_none() && max.is_none() {
                    return Ok(ToolResult::error(
                        "Range searches need 'min_amount' or 'max_amount'",
                    ));
                }
                let docs = self.store.search_range(min, max);
                let bounds = format!(
                    "between {} and {}",
                    min.map(format_amount).unwrap_or_else(|| "any".into()),
                    max.map(format_amount).unwrap_or_else(|| "any".into())
                );
                render_results(&bounds, &docs)
            }
            other => return Ok(ToolResult::error(format!("Unknown search_type '{}'", other))),
        };

        Ok(ToolResult::text(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> SearchTool {
        SearchTool::new(Arc::new(DocumentStore::sample().unwrap()))
    }

    async fn run(args: serde_json::Value) -> ToolResult {
        tool()
            .execute("call_1", args, CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_keyword_search_embeds_ids() {
        let result = run(json!({"query": "Acme"})).await;
        assert!(!result.is_error);
        let text = result.text_content();
        assert!(text.contains("ID: INV-001"), "got: {}", text);
        assert!(text.contains("ID: CON-001"), "got: {}", text);
    }

    #[tokio::test]
    async fn test_type_search() {
        let text = run(json!({"query": "claims", "search_type": "type"}))
            .await
            .text_content();
        assert!(text.starts_with("Found 2 document(s)"), "got: {}", text);
    }

    #[tokio::test]
    async fn test_amount_search() {
        let text = run(json!({
            "query": "invoices over 100k",
            "search_type": "amount",
            "comparison": "over",
            "amount": 100000
        }))
        .await
        .text_content();
        assert!(text.contains("ID: INV-003"));
        assert!(text.contains("ID: CON-001"));
        assert!(!text.contains("ID: INV-001"));
    }

    #[tokio::test]
    async fn test_range_search() {
        let text = run(json!({
            "query": "mid-size",
            "search_type": "amount_range",
            "min_amount": 10000,
            "max_amount": 25000
        }))
        .await
        .text_content();
        assert!(text.contains("ID: INV-001"));
        assert!(text.contains("ID: CLM-001"));
    }

    #[tokio::test]
    async fn test_empty_query_flagged() {
        let result = run(json!({"query": "   "})).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_no_results() {
        let result = run(json!({"query": "spaceship"})).await;
        assert!(!result.is_error);
        assert!(result.text_content().starts_with("No documents found"));
    }

    #[test]
    fn test_schema_requires_query() {
        let schema = tool().parameters_schema();
        assert_eq!(schema["required"], json!(["query"]));
    }
}
