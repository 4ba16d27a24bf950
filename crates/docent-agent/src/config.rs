//! Assistant configuration

use std::time::Duration;

/// Configuration for the workflow and session layer
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Prior turns rendered into the classification prompt
    pub history_turns: usize,
    /// Prior messages replayed to task handlers
    pub message_window: usize,
    /// Limit for a single reasoning-engine call (`None` waits forever)
    pub engine_timeout: Option<Duration>,
    /// Limit for a single tool execution (`None` waits forever)
    pub tool_timeout: Option<Duration>,
    /// Rolling conversation summary settings
    pub summary: SummaryConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            history_turns: 5,
            message_window: 4,
            engine_timeout: Some(Duration::from_secs(120)),
            tool_timeout: Some(Duration::from_secs(30)),
            summary: SummaryConfig::default(),
        }
    }
}

/// Rolling summary refresh after each committed turn
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub enabled: bool,
    /// Word budget handed to the summary prompt
    pub max_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_words: 150,
        }
    }
}
