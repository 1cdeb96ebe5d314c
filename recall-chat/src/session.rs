//! In-process conversation history and derived statistics

use chrono::{DateTime, Duration, Local};
use serde::Serialize;

use crate::prompt::format_duration;

/// One completed exchange. Lives only as long as the process.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Local>,
    pub user_utterance: String,
    pub assistant_response: String,
    /// Whether any memory was injected into the prompt
    pub used_context: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_questions: usize,
    pub questions_with_context: usize,
    /// `"66.7%"`, or `"0%"` before the first turn
    pub context_usage_rate: String,
    pub session_duration: String,
}

impl SessionStats {
    pub fn compute(turns: &[ConversationTurn], elapsed: Duration) -> Self {
        let total_questions = turns.len();
        let questions_with_context = turns.iter().filter(|t| t.used_context).count();

        let context_usage_rate = if total_questions == 0 {
            "0%".to_string()
        } else {
            format!(
                "{:.1}%",
                questions_with_context as f64 / total_questions as f64 * 100.0
            )
        };

        Self {
            total_questions,
            questions_with_context,
            context_usage_rate,
            session_duration: format_duration(elapsed),
        }
    }

    /// Label/value pairs for display
    pub fn rows(&self) -> [(&'static str, String); 4] {
        [
            ("Total Questions", self.total_questions.to_string()),
            ("Questions With Context", self.questions_with_context.to_string()),
            ("Session Duration", self.session_duration.clone()),
            ("Context Usage Rate", self.context_usage_rate.clone()),
        ]
    }
}
