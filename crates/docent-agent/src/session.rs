//! Session API

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::events::WorkflowEvent;
use crate::memory::summarize_history;
use crate::schema::{Intent, StructuredResponse};
use crate::state::ConversationState;
use crate::workflow::Workflow;

/// Result of one processed message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub session_id: String,
    pub response: StructuredResponse,
    pub intent: Intent,
    pub tools_used: Vec<String>,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub user_id: String,
    pub turn_count: usize,
    pub active_documents: BTreeSet<String>,
    pub conversation_summary: String,
    pub message_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

struct SessionRecord {
    /// Last committed state
    state: Mutex<ConversationState>,
    created_at: chrono::DateTime<chrono::Utc>,
    /// Held for the whole of a turn so turns on one session run one at a time
    turn: tokio::sync::Mutex<()>,
}

/// Multi-session front door to a compiled [`Workflow`]
pub struct Assistant {
    workflow: Arc<Workflow>,
    sessions: Mutex<HashMap<String, Arc<SessionRecord>>>,
}

impl Assistant {
    pub fn new(workflow: Arc<Workflow>) -> Self {
        Self {
            workflow,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn workflow(&self) -> &Arc<Workflow> {
        &self.workflow
    }

    /// Subscribe to workflow events from every session
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.workflow.subscribe()
    }

    /// Open a session and return its id
    pub fn start_session(&self, user_id: &str) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        self.sessions.lock().insert(
            session_id.clone(),
            Arc::new(SessionRecord {
                state: Mutex::new(ConversationState::new(session_id.clone(), user_id)),
                created_at: chrono::Utc::now(),
                turn: tokio::sync::Mutex::new(()),
            }),
        );
        info!(session = %session_id, user = %user_id, "Session started");
        session_id
    }

    fn record(&self, session_id: &str) -> Result<Arc<SessionRecord>> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::UnknownSession(session_id.to_string()))
    }

    /// Run one message through the workflow.
    ///
    /// The turn works on a copy of the stored state; the copy replaces the
    /// stored one only when the turn succeeds. A second message for the same
    /// session waits until the first turn has committed or failed.
    pub async fn process_message(&self, session_id: &str, text: &str) -> Result<TurnOutcome> {
        let record = self.record(session_id)?;
        let _turn = record.turn.lock().await;

        let mut state = record.state.lock().clone();
        state.begin_turn(text);

        self.workflow.run(&mut state).await?;

        let (Some(response), Some(intent)) = (state.current_response.clone(), state.intent.clone())
        else {
            return Err(Error::InvalidGraph(
                "workflow finished without a response".into(),
            ));
        };

        let summary_config = &self.workflow.config().summary;
        if summary_config.enabled {
            match summarize_history(
                self.workflow.engine().as_ref(),
                &state.conversation_history,
                self.workflow.config(),
            )
            .await
            {
                Ok(summary) => state.conversation_summary = summary,
                Err(e) => warn!(session = %session_id, "Summary refresh failed: {}", e),
            }
        }

        let outcome = TurnOutcome {
            session_id: session_id.to_string(),
            response,
            intent,
            tools_used: state.tools_used.clone(),
        };

        // Ended while the turn ran
        if !self.sessions.lock().contains_key(session_id) {
            return Err(Error::UnknownSession(session_id.to_string()));
        }
        *record.state.lock() = state;
        Ok(outcome)
    }

    pub fn session(&self, session_id: &str) -> Result<SessionSnapshot> {
        let record = self.record(session_id)?;
        let state = record.state.lock();
        Ok(SessionSnapshot {
            session_id: session_id.to_string(),
            user_id: state.user_id.clone(),
            turn_count: state.conversation_history.len(),
            active_documents: state.active_documents.clone(),
            conversation_summary: state.conversation_summary.clone(),
            message_count: state.messages.len(),
            created_at: record.created_at,
        })
    }

    /// Drop a session
    pub fn end_session(&self, session_id: &str) -> Result<()> {
        self.sessions
            .lock()
            .remove(session_id)
            .map(|_| info!(session = %session_id, "Session ended"))
            .ok_or_else(|| Error::UnknownSession(session_id.to_string()))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
