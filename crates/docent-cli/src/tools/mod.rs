//! Built-in document tools

mod calculator;
mod reader;
mod search;
mod statistics;
mod store;

pub use calculator::{format_number, CalculatorTool};
pub use reader::ReaderTool;
pub use search::SearchTool;
pub use statistics::StatisticsTool;
pub use store::DocumentStore;

use docent_agent::BoxedTool;
use std::sync::Arc;

/// Every tool the assistant offers, sharing one corpus
pub fn document_tools(store: Arc<DocumentStore>) -> Vec<BoxedTool> {
    vec![
        Arc::new(SearchTool::new(store.clone())),
        Arc::new(ReaderTool::new(store.clone())),
        Arc::new(StatisticsTool::new(store)),
        Arc::new(CalculatorTool::new()),
    ]
}
