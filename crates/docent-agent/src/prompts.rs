//! Prompt templates with named `{slot}` placeholders

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::IntentType;

static SLOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("slot pattern is valid"));

/// A text template; `{name}` marks a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    pub const fn new(name: &'static str, text: &'static str) -> Self {
        Self { name, text }
    }

    /// Slot names in order of first appearance
    pub fn slots(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for cap in SLOT_PATTERN.captures_iter(self.text) {
            if let Some(m) = cap.get(1) {
                let slot = m.as_str();
                if !seen.contains(&slot) {
                    seen.push(slot);
                }
            }
        }
        seen
    }

    /// Fill every slot. Values are inserted verbatim and never re-scanned.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        if let Some(missing) = self.slots().into_iter().find(|s| !values.contains_key(s)) {
            return Err(Error::Template(format!(
                "template '{}' is missing a value for '{}'",
                self.name, missing
            )));
        }
        let rendered = SLOT_PATTERN.replace_all(self.text, |caps: &regex::Captures<'_>| {
            values.get(&caps[1]).copied().unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}

pub const INTENT_CLASSIFICATION: PromptTemplate = PromptTemplate::new(
    "intent_classification",
    r#"You classify requests for a document analysis assistant that works with invoices, contracts and claims.
Classify the user's intent as one of: qa, summarization, calculation, unknown.

Return:
- intent_type: one of qa, summarization, calculation, unknown
- confidence: a number between 0 and 1
- reasoning: one sentence explaining the decision

Categories:
- qa: a specific question answered from document content
- summarization: a request to summarize or give an overview of documents
- calculation: a request to compute, total, add, subtract, multiply, divide or average values
- unknown: anything else, or too ambiguous to decide

Examples:
"What's the total amount in invoice INV-001?" -> qa
"Summarize all contracts" -> summarization
"Calculate the sum of all invoice totals" -> calculation
"Tell me about our performance" -> unknown

Conversation history:
{conversation_history}

User input:
{user_input}
"#,
);

pub const QA_SYSTEM: PromptTemplate = PromptTemplate::new(
    "qa_system",
    r#"You are a document assistant answering questions about financial and healthcare documents.

Tool usage:
1. document_search requires:
   - query: the search terms (required, never empty)
   - search_type: "keyword" (default), "type", "amount" or "amount_range"
   - for amounts such as "over $50,000" use comparison="over", amount=50000
   - "under $10,000": comparison="under", amount=10000
   - "between X and Y": min_amount=X, max_amount=Y
   - "around $25,000": comparison="approximate", amount=25000
   - "exactly $100,000": comparison="exact", amount=100000
2. document_reader requires doc_id, the exact document ID.
3. calculator requires expression, the arithmetic to evaluate.
4. document_statistics takes no arguments and describes the whole collection.

Search before answering questions about document content. Cite sources by document ID.
If the information is not found, say so.

Conversation context: {conversation_summary}

User question: {user_input}
"#,
);

pub const SUMMARIZATION_SYSTEM: PromptTemplate = PromptTemplate::new(
    "summarization_system",
    r#"You are an expert summarizer of financial and healthcare documents.

Tool usage:
1. document_search requires:
   - query: the search terms (required, use words from the request)
   - search_type: "keyword" (default), "type" or "amount_range"
2. document_reader requires doc_id, the exact document ID.

Search for the relevant documents first, then read them. Extract the key points,
highlight important numbers, dates and parties, and cite document IDs.

Conversation context: {conversation_summary}

User request: {user_input}
"#,
);

pub const CALCULATION_SYSTEM: PromptTemplate = PromptTemplate::new(
    "calculation_system",
    r#"You are a precise calculation assistant for document-related computations.

Tool usage:
1. calculator requires expression, the arithmetic to evaluate.
2. document_search requires query, terms related to the numbers you need.
3. document_reader requires doc_id, the exact document ID.

Search documents first when you need numbers that were not given, then use the
calculator for every computation. Show your work step by step.

Conversation context: {conversation_summary}

User request: {user_input}
"#,
);

pub const QA_FINAL: PromptTemplate = PromptTemplate::new(
    "qa_final",
    "Based on the tool results and the conversation, give a complete answer to: {user_input}\n\nInclude the IDs of the documents you used as sources.",
);

pub const SUMMARIZATION_FINAL: PromptTemplate = PromptTemplate::new(
    "summarization_final",
    "Based on the documents you have read, write a summary for: {user_input}\n\nExtract 3-5 key points and include the IDs of the documents you summarized.",
);

pub const CALCULATION_FINAL: PromptTemplate = PromptTemplate::new(
    "calculation_final",
    "Based on the tool outputs and the conversation, give the calculation for: {user_input}\n\nInclude the expression used, a step-by-step explanation and the numeric result.",
);

pub const MEMORY_SUMMARY: PromptTemplate = PromptTemplate::new(
    "memory_summary",
    r#"Summarize this conversation in at most {max_length} words:

{conversation_history}

Cover the topics discussed, the documents referenced, important findings or
calculations, and any open questions.

Summary:"#,
);

/// System prompt template for the task an intent routes to
pub fn system_template_for(intent: IntentType) -> PromptTemplate {
    match intent {
        IntentType::Summarization => SUMMARIZATION_SYSTEM,
        IntentType::Calculation => CALCULATION_SYSTEM,
        IntentType::Qa | IntentType::Unknown => QA_SYSTEM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_slots() {
        let text = INTENT_CLASSIFICATION
            .render(&[
                ("user_input", "Summarize all contracts"),
                ("conversation_history", "User: hi"),
            ])
            .unwrap();
        assert!(text.contains("Summarize all contracts"));
        assert!(text.contains("User: hi"));
        assert!(!text.contains("{user_input}"));
    }

    #[test]
    fn test_render_missing_slot_is_error() {
        let err = QA_SYSTEM.render(&[("user_input", "x")]).unwrap_err();
        assert!(err.to_string().contains("conversation_summary"), "got: {}", err);
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let text = QA_FINAL.render(&[("user_input", "what is {user_input}?")]).unwrap();
        assert!(text.contains("what is {user_input}?"));
    }

    #[test]
    fn test_slots_listed_once() {
        assert_eq!(
            MEMORY_SUMMARY.slots(),
            vec!["max_length", "conversation_history"]
        );
        assert_eq!(
            CALCULATION_SYSTEM.slots(),
            vec!["conversation_summary", "user_input"]
        );
    }

    #[test]
    fn test_system_template_selection() {
        assert_eq!(system_template_for(IntentType::Qa), QA_SYSTEM);
        assert_eq!(
            system_template_for(IntentType::Summarization),
            SUMMARIZATION_SYSTEM
        );
        assert_eq!(
            system_template_for(IntentType::Calculation),
            CALCULATION_SYSTEM
        );
        assert_eq!(system_template_for(IntentType::Unknown), QA_SYSTEM);
    }
}
