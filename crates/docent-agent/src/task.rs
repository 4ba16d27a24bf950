//! Task handlers
//!
//! One generic handler, [`run_task`], drives every task. A [`TaskSpec`]
//! supplies what differs between them: the system template, the fallback
//! search query, the response type, the closing prompt and reconciliation.

use std::sync::Arc;

use docent_ai::{Context, Message, ReasoningEngine};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;

use crate::call::structured;
use crate::config::AssistantConfig;
use crate::error::Result;
use crate::events::WorkflowEvent;
use crate::prompts::{
    system_template_for, PromptTemplate, CALCULATION_FINAL, QA_FINAL, SUMMARIZATION_FINAL,
};
use crate::reconcile::{reconcile_answer, reconcile_calculation, reconcile_summary};
use crate::schema::{
    AnswerResponse, CalculationResponse, IntentType, StructuredResponse, SummarizationResponse,
};
use crate::state::{ConversationState, Route};
use crate::tool::ToolRegistry;
use crate::tool_loop::{run_tool_round, RoundOptions, ToolRound};

/// What varies between task handlers
pub trait TaskSpec: Send + Sync {
    type Response: JsonSchema + DeserializeOwned + Into<StructuredResponse> + Send;

    /// Intent whose system template this task uses
    fn intent(&self) -> IntentType;

    /// Query used when a `document_search` call omits one
    fn default_query(&self, user_input: &str) -> String;

    /// Closing request for the structured response
    fn final_prompt(&self) -> PromptTemplate;

    /// Fill gaps in `response` from the tool round
    fn reconcile(&self, response: &mut Self::Response, round: &ToolRound);

    fn validate(&self, _response: &Self::Response) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QaTask;

impl TaskSpec for QaTask {
    type Response = AnswerResponse;

    fn intent(&self) -> IntentType {
        IntentType::Qa
    }

    fn default_query(&self, user_input: &str) -> String {
        user_input.to_string()
    }

    fn final_prompt(&self) -> PromptTemplate {
        QA_FINAL
    }

    fn reconcile(&self, response: &mut AnswerResponse, round: &ToolRound) {
        reconcile_answer(response, round);
    }

    fn validate(&self, response: &AnswerResponse) -> Result<()> {
        response.validate()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SummarizationTask;

impl TaskSpec for SummarizationTask {
    type Response = SummarizationResponse;

    fn intent(&self) -> IntentType {
        IntentType::Summarization
    }

    fn default_query(&self, user_input: &str) -> String {
        user_input
            .split_whitespace()
            .take(5)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn final_prompt(&self) -> PromptTemplate {
        SUMMARIZATION_FINAL
    }

    fn reconcile(&self, response: &mut SummarizationResponse, round: &ToolRound) {
        reconcile_summary(response, round);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CalculationTask;

impl TaskSpec for CalculationTask {
    type Response = CalculationResponse;

    fn intent(&self) -> IntentType {
        IntentType::Calculation
    }

    fn default_query(&self, _user_input: &str) -> String {
        "total amount sum calculate".to_string()
    }

    fn final_prompt(&self) -> PromptTemplate {
        CALCULATION_FINAL
    }

    fn reconcile(&self, response: &mut CalculationResponse, round: &ToolRound) {
        reconcile_calculation(response, round);
    }
}

/// Shared collaborators of every task run
pub struct TaskDeps<'a> {
    pub engine: &'a Arc<dyn ReasoningEngine>,
    pub registry: &'a ToolRegistry,
    pub config: &'a AssistantConfig,
    pub events: &'a broadcast::Sender<WorkflowEvent>,
}

/// Run one task against `state`, leaving the structured response and tools
/// used on it and routing on to the memory updater
pub async fn run_task<T: TaskSpec>(
    task: &T,
    deps: &TaskDeps<'_>,
    state: &mut ConversationState,
) -> Result<()> {
    let system = system_template_for(task.intent()).render(&[
        ("conversation_summary", state.conversation_summary.as_str()),
        ("user_input", state.user_input.as_str()),
    ])?;

    let mut context = Context::with_system(system);
    context
        .messages
        .extend(state.messages.recent(deps.config.message_window).iter().cloned());
    context.push(Message::user(state.user_input.clone()));

    let default_query = task.default_query(&state.user_input);
    let round = run_tool_round(
        deps.engine.as_ref(),
        deps.registry,
        context.clone(),
        RoundOptions {
            default_query: &default_query,
            engine_timeout: deps.config.engine_timeout,
            tool_timeout: deps.config.tool_timeout,
            events: deps.events,
        },
    )
    .await?;

    context.messages.extend(round.messages.iter().cloned());
    let closing = task
        .final_prompt()
        .render(&[("user_input", state.user_input.as_str())])?;
    context.push(Message::user(closing));

    let mut response: T::Response =
        structured(deps.engine.as_ref(), &context, deps.config.engine_timeout).await?;
    task.reconcile(&mut response, &round);
    task.validate(&response)?;

    debug!(
        intent = %task.intent(),
        tools_used = ?round.tools_used,
        "Task produced structured response"
    );

    state.current_response = Some(response.into());
    state.tools_used = round.tools_used;
    state.next_route = Some(Route::UpdateMemory);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{boxed, MockEngine, MockTool};
    use crate::tool_loop::{CALCULATOR_TOOL, SEARCH_TOOL};

    struct Harness {
        engine: Arc<MockEngine>,
        dyn_engine: Arc<dyn ReasoningEngine>,
        registry: ToolRegistry,
        config: AssistantConfig,
        events: broadcast::Sender<WorkflowEvent>,
    }

    impl Harness {
        fn new(tools: Vec<Arc<MockTool>>) -> Self {
            let engine = Arc::new(MockEngine::new());
            let (events, _) = broadcast::channel(64);
            Self {
                dyn_engine: engine.clone(),
                engine,
                registry: ToolRegistry::new(tools.iter().map(boxed)),
                config: AssistantConfig::default(),
                events,
            }
        }

        fn deps(&self) -> TaskDeps<'_> {
            TaskDeps {
                engine: &self.dyn_engine,
                registry: &self.registry,
                config: &self.config,
                events: &self.events,
            }
        }
    }

    fn state_with_input(input: &str) -> ConversationState {
        let mut state = ConversationState::new("s", "u");
        state.begin_turn(input);
        state
    }

    #[test]
    fn test_default_queries() {
        assert_eq!(QaTask.default_query("What is INV-001?"), "What is INV-001?");
        assert_eq!(
            SummarizationTask.default_query("Summarize   all the contracts from last year please"),
            "Summarize all the contracts from"
        );
        assert_eq!(
            CalculationTask.default_query("anything"),
            "total amount sum calculate"
        );
    }

    #[tokio::test]
    async fn test_qa_sources_from_tool_output() {
        let search = MockTool::text(SEARCH_TOOL, "Found 1 document:\n- ID: INV-001 invoice $500");
        let h = Harness::new(vec![search.clone()]);
        h.engine
            .push_tool_calls(vec![("c1", SEARCH_TOOL, serde_json::json!({}))]);
        h.engine
            .push_structured(serde_json::json!({"answer": "The total is $500", "confidence": 0.9}));

        let mut state = state_with_input("What is the total in invoice INV-001?");
        run_task(&QaTask, &h.deps(), &mut state).await.unwrap();

        match state.current_response.as_ref().unwrap() {
            StructuredResponse::Answer(answer) => {
                assert!(answer.sources.contains("INV-001"));
                assert_eq!(answer.answer, "The total is $500");
            }
            other => panic!("expected answer, got {:?}", other),
        }
        assert_eq!(state.tools_used, vec![SEARCH_TOOL]);
        assert_eq!(state.next_route, Some(Route::UpdateMemory));
        assert_eq!(
            search.recorded()[0]["query"],
            "What is the total in invoice INV-001?"
        );
    }

    #[tokio::test]
    async fn test_context_window_and_final_prompt() {
        let h = Harness::new(vec![]);
        h.engine.push_structured(serde_json::json!({"summary": "s"}));

        let mut state = state_with_input("Summarize contracts");
        state.conversation_summary = "talked about invoices".into();
        state
            .messages
            .append((0..6).map(|i| Message::user(format!("old {i}"))));
        run_task(&SummarizationTask, &h.deps(), &mut state)
            .await
            .unwrap();

        let ctx = h.engine.last_tool_context().unwrap();
        let system = ctx.system_prompt.unwrap();
        assert!(system.contains("talked about invoices"));
        assert!(system.contains("User request: Summarize contracts"));
        let texts: Vec<String> = ctx.messages.iter().map(|m| m.text()).collect();
        assert_eq!(
            texts,
            vec!["old 2", "old 3", "old 4", "old 5", "Summarize contracts"]
        );

        let structured_ctx = h.engine.structured_contexts.lock()[0].clone();
        let last = structured_ctx.messages.last().unwrap().text();
        assert!(last.contains("key points"));
        assert!(structured_ctx.tools.is_empty());
        assert_eq!(h.engine.schema_names(), vec!["SummarizationResponse"]);
    }

    #[tokio::test]
    async fn test_calculation_reconciled() {
        let calc = MockTool::text(CALCULATOR_TOOL, "The result of 1500 + 2500 is 4,000");
        let h = Harness::new(vec![calc]);
        h.engine.push_tool_calls(vec![(
            "c1",
            CALCULATOR_TOOL,
            serde_json::json!({"expression": "1500 + 2500"}),
        )]);
        h.engine
            .push_structured(serde_json::json!({"explanation": "Added both invoices"}));

        let mut state = state_with_input("Add 1500 and 2500");
        run_task(&CalculationTask, &h.deps(), &mut state)
            .await
            .unwrap();

        match state.current_response.unwrap() {
            StructuredResponse::Calculation(calc) => {
                assert_eq!(calc.expression, "1500 + 2500");
                assert_eq!(calc.result, Some(4000.0));
                assert_eq!(calc.explanation, "Added both invoices");
            }
            other => panic!("expected calculation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_structured_failure_leaves_state() {
        let h = Harness::new(vec![]);
        h.engine
            .push_structured_error(docent_ai::Error::UnexpectedResponse("empty".into()));
        let mut state = state_with_input("question");
        let err = run_task(&QaTask, &h.deps(), &mut state).await.unwrap_err();
        assert!(err.is_engine_failure());
        assert!(state.current_response.is_none());
        assert_eq!(state.next_route, None);
    }

    #[tokio::test]
    async fn test_qa_invalid_confidence_is_malformed() {
        let h = Harness::new(vec![]);
        h.engine
            .push_structured(serde_json::json!({"answer": "x", "confidence": 3.0}));
        let mut state = state_with_input("question");
        let err = run_task(&QaTask, &h.deps(), &mut state).await.unwrap_err();
        assert!(matches!(err, crate::error::Error::MalformedOutput(_)));
    }
}
