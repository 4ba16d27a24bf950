//! Memory updates after a completed task

use docent_ai::{Context, Message, ReasoningEngine};
use tracing::debug;

use crate::call::with_timeout;
use crate::classifier::render_history;
use crate::config::AssistantConfig;
use crate::error::{Error, Result};
use crate::prompts::MEMORY_SUMMARY;
use crate::schema::ConversationTurn;
use crate::state::{ConversationState, Route};

/// Fold the turn's structured response into the conversation.
///
/// Merges referenced documents into the active set, records the exchange as
/// plain user/assistant messages and as a history turn, then ends the turn.
pub fn update_memory(state: &mut ConversationState) -> Result<()> {
    let response = state.current_response.clone().ok_or_else(|| {
        Error::InvalidGraph("memory update reached without a task response".into())
    })?;

    state
        .active_documents
        .extend(response.document_refs().into_iter().map(str::to_string));

    state.messages.append([
        Message::user(state.user_input.clone()),
        Message::assistant(response.primary_text()),
    ]);
    state
        .conversation_history
        .push(ConversationTurn::new(state.user_input.clone(), response));
    state.next_route = Some(Route::End);

    debug!(
        turns = state.conversation_history.len(),
        active_documents = state.active_documents.len(),
        "Memory updated"
    );
    Ok(())
}

/// Ask the engine for a fresh rolling summary of the whole history
pub async fn summarize_history(
    engine: &dyn ReasoningEngine,
    history: &[ConversationTurn],
    config: &AssistantConfig,
) -> Result<String> {
    let rendered = render_history(history, history.len(), "");
    let max_words = config.summary.max_words.to_string();
    let prompt = MEMORY_SUMMARY.render(&[
        ("conversation_history", rendered.as_str()),
        ("max_length", max_words.as_str()),
    ])?;
    let summary = with_timeout(config.engine_timeout, "conversation summary", async {
        Ok(engine.complete(&Context::from_prompt(prompt)).await?)
    })
    .await?;
    Ok(summary.trim().to_string())
}
