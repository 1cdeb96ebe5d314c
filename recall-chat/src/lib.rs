//! # Recall Chat
//!
//! Terminal chat clients that answer through an LLM and remember earlier
//! conversations through [`recall_memory`].
//!
//! [`ChatOrchestrator`] drives a turn: search memory for context, compose
//! the prompt, generate, optionally write the exchange back, and record the
//! turn for session statistics.

pub mod config;
pub mod demo;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod session;
pub mod terminal;

pub use config::{ChatOptions, LlmConfig, MemoryBackend};
pub use error::{Error, Result};
pub use llm::{build_llm_client, LlmClient};
pub use orchestrator::{ChatOrchestrator, ChatReply, PersistOutcome};
pub use policy::PersistencePolicy;
pub use session::{ConversationTurn, SessionStats};
