//! Memory-augmented chat turns
//!
//! A turn runs retrieve, compose, generate, persist and record in that
//! order. Only generation decides the answer; memory trouble on either side
//! of it degrades to warnings on the [`ChatReply`].

use std::sync::Arc;

use chrono::{DateTime, Local};
use recall_memory::MemoryFacade;
use serde::Serialize;

use crate::config::ChatOptions;
use crate::llm::LlmClient;
use crate::prompt::{compose_prompt, memory_text};
use crate::session::{ConversationTurn, SessionStats};

/// What happened to the turn's memory write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PersistOutcome {
    Saved,
    /// Policy declined, or generation failed
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    /// Memories injected into the prompt, most relevant first
    pub context: Vec<String>,
    pub used_context: bool,
    pub persisted: PersistOutcome,
    pub warnings: Vec<String>,
}

pub struct ChatOrchestrator {
    memory: MemoryFacade,
    llm: Arc<dyn LlmClient>,
    options: ChatOptions,
    turns: Vec<ConversationTurn>,
    started_at: DateTime<Local>,
}

impl ChatOrchestrator {
    pub fn new(memory: MemoryFacade, llm: Arc<dyn LlmClient>, options: ChatOptions) -> Self {
        Self {
            memory,
            llm,
            options,
            turns: Vec::new(),
            started_at: Local::now(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Run one turn. Always yields an answer, even when every collaborator fails.
    pub async fn chat(&mut self, utterance: &str) -> ChatReply {
        let mut warnings = Vec::new();

        let context = match self.memory.search(utterance, self.options.context_limit).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Memory search failed, answering without context");
                warnings.push(format!("Memory search failed: {e}"));
                Vec::new()
            }
        };

        let now = Local::now();
        let prompt = compose_prompt(
            &context,
            utterance,
            now.naive_local(),
            now.signed_duration_since(self.started_at),
        );
        tracing::debug!(
            memories = context.len(),
            prompt_chars = prompt.chars().count(),
            "Generating answer"
        );

        let answer = match self.llm.generate(&prompt).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, model = %self.llm.model_name(), "Generation failed");
                let answer = format!("Error communicating with {}: {}", self.llm.model_name(), e);
                self.record(utterance, &answer, false);

                return ChatReply {
                    answer,
                    context,
                    used_context: false,
                    persisted: PersistOutcome::Skipped,
                    warnings,
                };
            }
        };

        let persisted = if self.options.persistence.should_persist(utterance) {
            let text = memory_text(utterance, &answer, Local::now().naive_local());
            match self.memory.save(&text).await {
                Ok(_) => PersistOutcome::Saved,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save conversation to memory");
                    warnings.push(format!("Failed to save conversation: {e}"));
                    PersistOutcome::Failed(e.to_string())
                }
            }
        } else {
            PersistOutcome::Skipped
        };

        let used_context = !context.is_empty();
        self.record(utterance, &answer, used_context);

        ChatReply {
            answer,
            context,
            used_context,
            persisted,
            warnings,
        }
    }

    fn record(&mut self, utterance: &str, answer: &str, used_context: bool) {
        self.turns.push(ConversationTurn {
            timestamp: Local::now(),
            user_utterance: utterance.to_string(),
            assistant_response: answer.to_string(),
            used_context,
        });
    }

    /// Direct memory search, bypassing generation
    pub async fn search_memories(
        &self,
        query: &str,
        limit: usize,
    ) -> recall_memory::Result<Vec<String>> {
        self.memory.search(query, limit).await
    }

    pub async fn all_memories(&self) -> recall_memory::Result<Vec<String>> {
        self.memory.get_all().await
    }

    /// Last `n` turns, oldest first
    pub fn history(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::compute(
            &self.turns,
            Local::now().signed_duration_since(self.started_at),
        )
    }
}
