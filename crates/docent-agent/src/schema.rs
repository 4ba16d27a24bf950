//! Typed response shapes
//!
//! These types double as the JSON Schemas handed to the reasoning engine for
//! structured output, so field docs are written for the model. Every field
//! has a serde default: an omitted field is a gap to reconcile, not a parse
//! failure.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Task category of a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// A specific question answered from documents
    Qa,
    /// A request to summarize one or more documents
    Summarization,
    /// A request to compute values
    Calculation,
    /// Anything else or ambiguous
    #[serde(other)]
    Unknown,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Qa => "qa",
            IntentType::Summarization => "summarization",
            IntentType::Calculation => "calculation",
            IntentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified intent of a user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Intent {
    /// One of qa, summarization, calculation, unknown
    pub intent_type: IntentType,
    /// Confidence between 0 and 1
    #[serde(default)]
    pub confidence: f64,
    /// Brief explanation of the decision
    #[serde(default)]
    pub reasoning: String,
}

impl Intent {
    pub fn new(intent_type: IntentType, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            intent_type,
            confidence,
            reasoning: reasoning.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::Classification(format!(
                "confidence {} is outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Answer to a question about documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerResponse {
    /// The answer to the user's question
    #[serde(default)]
    pub answer: String,
    /// IDs of the documents the answer is based on
    #[serde(default)]
    pub sources: BTreeSet<String>,
    /// Confidence between 0 and 1
    #[serde(default)]
    pub confidence: f64,
}

impl AnswerResponse {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::MalformedOutput(format!(
                "answer confidence {} is outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Summary of one or more documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummarizationResponse {
    /// The summary text
    #[serde(default)]
    pub summary: String,
    /// Three to five key points
    #[serde(default)]
    pub key_points: Vec<String>,
    /// IDs of the summarized documents
    #[serde(default)]
    pub document_ids: BTreeSet<String>,
    /// Character length of the summarized material, 0 if unknown
    #[serde(default)]
    pub original_length: u64,
}

/// Result of a calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalculationResponse {
    /// The expression that was evaluated
    #[serde(default)]
    pub expression: String,
    /// Numeric result, null if it could not be determined
    #[serde(default)]
    pub result: Option<f64>,
    /// Step-by-step explanation of the calculation
    #[serde(default)]
    pub explanation: String,
}

/// The structured response of one turn; the variant follows the route taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructuredResponse {
    Answer(AnswerResponse),
    Summarization(SummarizationResponse),
    Calculation(CalculationResponse),
}

impl StructuredResponse {
    /// The text shown to the user: answer, summary or explanation
    pub fn primary_text(&self) -> &str {
        match self {
            StructuredResponse::Answer(r) => &r.answer,
            StructuredResponse::Summarization(r) => &r.summary,
            StructuredResponse::Calculation(r) => &r.explanation,
        }
    }

    /// Document IDs the response references
    pub fn document_refs(&self) -> Vec<&str> {
        match self {
            StructuredResponse::Answer(r) => r.sources.iter().map(String::as_str).collect(),
            StructuredResponse::Summarization(r) => {
                r.document_ids.iter().map(String::as_str).collect()
            }
            StructuredResponse::Calculation(_) => vec![],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StructuredResponse::Answer(_) => "answer",
            StructuredResponse::Summarization(_) => "summarization",
            StructuredResponse::Calculation(_) => "calculation",
        }
    }
}

impl From<AnswerResponse> for StructuredResponse {
    fn from(r: AnswerResponse) -> Self {
        StructuredResponse::Answer(r)
    }
}

impl From<SummarizationResponse> for StructuredResponse {
    fn from(r: SummarizationResponse) -> Self {
        StructuredResponse::Summarization(r)
    }
}

impl From<CalculationResponse> for StructuredResponse {
    fn from(r: CalculationResponse) -> Self {
        StructuredResponse::Calculation(r)
    }
}

/// One completed exchange in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub agent_response: StructuredResponse,
    #[serde(default)]
    pub timestamp: i64,
}

impl ConversationTurn {
    pub fn new(user_input: impl Into<String>, agent_response: StructuredResponse) -> Self {
        Self {
            user_input: user_input.into(),
            agent_response,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
