//! Plain-text rendering of structured responses

use docent_agent::{StructuredResponse, TurnOutcome, WorkflowEvent};

use crate::tools::format_number;
use crate::utils::truncate_chars;

/// Progress text for a workflow event. A tool start leaves the line open
/// for its result. Turn boundaries and errors print nothing here.
pub fn progress_line(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::IntentClassified {
            intent_type,
            confidence,
            route,
        } => Some(format!(
            "[intent: {} ({:.0}%) -> {}]\n",
            intent_type,
            confidence * 100.0,
            route
        )),
        WorkflowEvent::ToolExecutionStart { tool_name, .. } => Some(format!("[{}...", tool_name)),
        WorkflowEvent::ToolExecutionEnd {
            result, is_error, ..
        } => {
            let preview = truncate_chars(result.lines().next().unwrap_or(""), 60);
            Some(if *is_error {
                format!(" error: {}]\n", preview)
            } else {
                format!(" {}]\n", preview)
            })
        }
        WorkflowEvent::ToolSkipped { tool_name } => {
            Some(format!("[skipped unknown tool {}]\n", tool_name))
        }
        _ => None,
    }
}

pub fn render_response(response: &StructuredResponse) -> String {
    let mut output = String::new();
    match response {
        StructuredResponse::Answer(answer) => {
            output.push_str(&answer.answer);
            output.push('\n');
            if !answer.sources.is_empty() {
                let sources: Vec<&str> = answer.sources.iter().map(String::as_str).collect();
                output.push_str(&format!("\nSources: {}\n", sources.join(", ")));
            }
            output.push_str(&format!("Confidence: {:.0}%\n", answer.confidence * 100.0));
        }
        StructuredResponse::Summarization(summary) => {
            output.push_str(&summary.summary);
            output.push('\n');
            if !summary.key_points.is_empty() {
                output.push_str("\nKey points:\n");
                for point in &summary.key_points {
                    output.push_str(&format!("  - {}\n", point));
                }
            }
            if !summary.document_ids.is_empty() {
                let ids: Vec<&str> = summary.document_ids.iter().map(String::as_str).collect();
                output.push_str(&format!("\nDocuments: {}\n", ids.join(", ")));
            }
        }
        StructuredResponse::Calculation(calc) => {
            if !calc.expression.is_empty() {
                output.push_str(&format!("Expression: {}\n", calc.expression));
            }
            match calc.result {
                Some(result) => output.push_str(&format!("Result: {}\n", format_number(result))),
                None => output.push_str("Result: unavailable\n"),
            }
            if !calc.explanation.is_empty() {
                output.push('\n');
                output.push_str(&calc.explanation);
                output.push('\n');
            }
        }
    }
    output
}

/// One-line footer naming the intent and tools behind a turn
pub fn render_footer(outcome: &TurnOutcome) -> String {
    let tools = if outcome.tools_used.is_empty() {
        "no tools".to_string()
    } else {
        outcome.tools_used.join(", ")
    };
    format!(
        "[{} ({:.0}%) | {}]",
        outcome.intent.intent_type,
        outcome.intent.confidence * 100.0,
        tools
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_agent::{AnswerResponse, CalculationResponse, Intent, IntentType};

    #[test]
    fn test_render_answer() {
        let response = StructuredResponse::from(AnswerResponse {
            answer: "The total is $22,000.00".into(),
            sources: ["INV-001".to_string()].into(),
            confidence: 0.9,
        });
        let text = render_response(&response);
        assert!(text.starts_with("The total is $22,000.00\n"));
        assert!(text.contains("Sources: INV-001"));
        assert!(text.contains("Confidence: 90%"));
    }

    #[test]
    fn test_render_calculation_without_result() {
        let response = StructuredResponse::from(CalculationResponse {
            expression: "a + b".into(),
            result: None,
            explanation: "".into(),
        });
        let text = render_response(&response);
        assert!(text.contains("Expression: a + b"));
        assert!(text.contains("Result: unavailable"));
    }

    #[test]
    fn test_progress_lines() {
        let skipped = WorkflowEvent::ToolSkipped {
            tool_name: "web_search".into(),
        };
        assert_eq!(
            progress_line(&skipped).as_deref(),
            Some("[skipped unknown tool web_search]\n")
        );
        let end = WorkflowEvent::ToolExecutionEnd {
            tool_call_id: "c1".into(),
            tool_name: "document_reader".into(),
            result: "Document not found: X\nmore".into(),
            is_error: true,
        };
        assert_eq!(
            progress_line(&end).as_deref(),
            Some(" error: Document not found: X]\n")
        );
    }

    #[test]
    fn test_errors_are_not_progress() {
        let error = WorkflowEvent::Error {
            message: "engine unavailable".into(),
        };
        assert_eq!(progress_line(&error), None);
    }

    #[test]
    fn test_render_footer() {
        let outcome = TurnOutcome {
            session_id: "s".into(),
            response: StructuredResponse::from(AnswerResponse::default()),
            intent: Intent::new(IntentType::Qa, 0.75, ""),
            tools_used: vec!["document_search".into(), "document_reader".into()],
        };
        assert_eq!(
            render_footer(&outcome),
            "[qa (75%) | document_search, document_reader]"
        );
    }
}
