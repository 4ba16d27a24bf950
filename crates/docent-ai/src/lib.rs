//! docent-ai: Reasoning engine contract
//!
//! This crate defines what the document assistant needs from a language
//! model (tool calling and schema-constrained output) and ships an
//! OpenAI-compatible implementation.

pub mod engine;
pub mod error;
pub mod providers;
pub mod types;

pub use engine::ReasoningEngine;
pub use error::{Error, Result};
pub use types::*;
