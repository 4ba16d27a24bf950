//! Collection statistics tool

use async_trait::async_trait;
use docent_agent::tool::{Tool, ToolResult};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::store::{format_amount, DocumentStore};

pub struct StatisticsTool {
    store: Arc<DocumentStore>,
}

impl StatisticsTool {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for StatisticsTool {
    fn name(&self) -> &str {
        "document_statistics"
    }

    fn description(&self) -> &str {
        "Summary figures for the whole collection: document counts per type, total and average amounts."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(
        &self,
        _tool_call_id: &str,
        _arguments: serde_json::Value,
        _cancel: CancellationToken,
    ) -> docent_agent::Result<ToolResult> {
        let stats = self.store.statistics();
        let mut output = format!(
            "Document collection statistics:\n- Total documents: {}\n",
            stats.total_documents
        );
        for (doc_type, count) in &stats.by_type {
            output.push_str(&format!("- {}: {}\n", doc_type, count));
        }
        output.push_str(&format!(
            "- Total amount: {}\n",
            format_amount(stats.total_amount)
        ));
        if let Some(average) = stats.average_amount {
            output.push_str(&format!("- Average amount: {}\n", format_amount(average)));
        }
        Ok(ToolResult::text(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_statistics_output() {
        let tool = StatisticsTool::new(Arc::new(DocumentStore::sample().unwrap()));
        let text = tool
            .execute("c", json!({}), CancellationToken::new())
            .await
            .unwrap()
            .text_content();
        assert!(text.contains("- Total documents: 8"));
        assert!(text.contains("- invoice: 4"));
        assert!(text.contains("- Total amount: $601,250.00"));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let tool = StatisticsTool::new(Arc::new(DocumentStore::default()));
        let text = tool
            .execute("c", json!({}), CancellationToken::new())
            .await
            .unwrap()
            .text_content();
        assert!(text.contains("- Total documents: 0"));
        assert!(!text.contains("Average"));
    }
}
