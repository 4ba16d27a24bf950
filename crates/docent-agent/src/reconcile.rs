//! Fill gaps in structured responses from what the tools returned
//!
//! Reconciliation only ever adds: a field the engine populated is kept as is.

use crate::extract::{extract_document_ids, parse_calculator_result};
use crate::schema::{AnswerResponse, CalculationResponse, SummarizationResponse};
use crate::tool_loop::{ToolRound, CALCULATOR_TOOL};
use std::collections::BTreeSet;

fn observed_ids(round: &ToolRound) -> BTreeSet<String> {
    round.outputs().flat_map(extract_document_ids).collect()
}

pub fn reconcile_answer(response: &mut AnswerResponse, round: &ToolRound) {
    if response.sources.is_empty() {
        response.sources = observed_ids(round);
    }
}

pub fn reconcile_summary(response: &mut SummarizationResponse, round: &ToolRound) {
    if response.document_ids.is_empty() {
        response.document_ids = observed_ids(round);
    }
    if response.original_length == 0 {
        response.original_length = round.outputs().map(|o| o.chars().count() as u64).sum();
    }
}

pub fn reconcile_calculation(response: &mut CalculationResponse, round: &ToolRound) {
    if response.expression.is_empty() {
        let expression = round
            .executions_of(CALCULATOR_TOOL)
            .filter_map(|e| e.arguments.get("expression").and_then(|v| v.as_str()))
            .last();
        if let Some(expression) = expression {
            response.expression = expression.to_string();
        }
    }
    if response.result.is_none() {
        response.result = round
            .executions_of(CALCULATOR_TOOL)
            .filter_map(|e| parse_calculator_result(&e.output))
            .last();
    }
}
