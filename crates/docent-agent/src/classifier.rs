//! Intent classification and routing

use std::time::Duration;

use docent_ai::{OutputSchema, ReasoningEngine};
use tracing::debug;

use crate::call::{decode, with_timeout};
use crate::error::{Error, Result};
use crate::prompts::INTENT_CLASSIFICATION;
use crate::schema::{ConversationTurn, Intent, IntentType};
use crate::state::Route;

/// Render the last `turns` exchanges as `User:`/`Assistant:` lines,
/// falling back to `summary` when there is nothing to render
pub fn render_history(history: &[ConversationTurn], turns: usize, summary: &str) -> String {
    let start = history.len().saturating_sub(turns);
    let mut lines = Vec::new();
    for turn in &history[start..] {
        lines.push(format!("User: {}", turn.user_input));
        lines.push(format!("Assistant: {}", turn.agent_response.primary_text()));
    }
    if lines.is_empty() {
        summary.to_string()
    } else {
        lines.join("\n")
    }
}

/// Where an intent sends the workflow
pub fn route_for(intent: IntentType) -> Route {
    match intent {
        IntentType::Qa => Route::Qa,
        IntentType::Summarization => Route::Summarization,
        IntentType::Calculation => Route::Calculation,
        IntentType::Unknown => Route::Qa,
    }
}

/// Classify `user_input` in the light of recent history
pub async fn classify_intent(
    engine: &dyn ReasoningEngine,
    user_input: &str,
    history: &str,
    timeout: Option<Duration>,
) -> Result<Intent> {
    let prompt = INTENT_CLASSIFICATION.render(&[
        ("user_input", user_input),
        ("conversation_history", history),
    ])?;
    let schema = OutputSchema::of::<Intent>();

    let value = with_timeout(timeout, "intent classification", async {
        engine
            .classify(&prompt, &schema)
            .await
            .map_err(|e| Error::Classification(e.to_string()))
    })
    .await?;

    let intent: Intent = decode(value).map_err(|e| Error::Classification(e.to_string()))?;
    intent.validate()?;

    debug!(
        intent = %intent.intent_type,
        confidence = intent.confidence,
        reasoning = %intent.reasoning,
        "Classified intent"
    );
    Ok(intent)
}
