//! Prompt and memory text layout

use chrono::{Duration, NaiveDateTime};
use recall_memory::facade::preview;

const PERSONA: &str = "You are a smart and helpful AI assistant.";

const INSTRUCTIONS: [&str; 4] = [
    "Answer clearly and in detail",
    "If there is relevant context from previous memories, use it",
    "If the question requires technical information, provide clear examples",
    "Be friendly and helpful",
];

/// Longest answer kept in a saved conversation
pub const SAVED_ANSWER_CHARS: usize = 500;

/// Build the generation prompt.
///
/// Memories appear in the order given; the context block is left out
/// entirely when `context` is empty.
pub fn compose_prompt(
    context: &[String],
    utterance: &str,
    now: NaiveDateTime,
    elapsed: Duration,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(PERSONA);
    prompt.push_str("\n\n");

    if !context.is_empty() {
        prompt.push_str("Relevant context from previous memories:\n");
        for (i, memory) in context.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, memory));
        }
        prompt.push_str("\n---\n\n");
    }

    prompt.push_str(&format!("Session time: {}\n", now.format("%Y-%m-%d %H:%M")));
    prompt.push_str(&format!("Session duration: {}\n\n", format_duration(elapsed)));
    prompt.push_str(&format!("User question: {utterance}\n\n"));

    prompt.push_str("Instructions:\n");
    for (i, line) in INSTRUCTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, line));
    }

    prompt
}

/// Text written to memory for a finished turn
pub fn memory_text(utterance: &str, answer: &str, now: NaiveDateTime) -> String {
    format!(
        "[{}] Conversation:\nQuestion: {}\nAnswer: {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        utterance,
        preview(answer, SAVED_ANSWER_CHARS)
    )
}

/// `H:MM:SS`, with `N day(s), ` in front past 24 hours. Sub-second parts are dropped.
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let rem = total % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);

    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::zero()), "0:00:00");
        assert_eq!(format_duration(Duration::milliseconds(65_900)), "0:01:05");
        assert_eq!(format_duration(Duration::seconds(3 * 3600 + 7)), "3:00:07");
        assert_eq!(format_duration(Duration::seconds(86_400 + 61)), "1 day, 0:01:01");
        assert_eq!(format_duration(Duration::days(3)), "3 days, 0:00:00");
    }

    #[test]
    fn prompt_sections_are_ordered() {
        let context = vec!["My name is Alex".to_string(), "I like pasta".to_string()];
        let prompt = compose_prompt(&context, "What is my name?", at(9, 5, 0), Duration::seconds(42));

        let positions: Vec<usize> = [
            PERSONA,
            "Relevant context from previous memories:",
            "1. My name is Alex",
            "2. I like pasta",
            "---",
            "Session time: 2025-03-14 09:05",
            "Session duration: 0:00:42",
            "User question: What is my name?",
            "Instructions:",
            "4. Be friendly and helpful",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle:?}")))
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{prompt}");
    }

    #[test]
    fn empty_context_omits_the_section() {
        let prompt = compose_prompt(&[], "hello", at(0, 0, 0), Duration::zero());
        assert!(!prompt.contains("Relevant context"));
        assert!(!prompt.contains("---"));
        assert!(prompt.contains("User question: hello"));
    }

    #[test]
    fn memory_text_layout() {
        let text = memory_text("I like pasta", "Noted!", at(13, 2, 9));
        assert_eq!(
            text,
            "[2025-03-14 13:02:09] Conversation:\nQuestion: I like pasta\nAnswer: Noted!"
        );
    }

    #[test]
    fn long_answers_are_cut_to_500_chars() {
        let answer = "é".repeat(600);
        let text = memory_text("q", &answer, at(0, 0, 0));
        let saved = text.split("Answer: ").nth(1).unwrap();

        assert_eq!(saved.chars().count(), 503);
        assert!(saved.ends_with("..."));
        assert_eq!(saved.trim_end_matches('.').chars().count(), 500);
    }
}
