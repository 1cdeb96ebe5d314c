//! Chat turn behaviour against stub LLMs and real memory stores.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recall_chat::{
    ChatOptions, ChatOrchestrator, Error, LlmClient, PersistOutcome, PersistencePolicy, Result,
};
use recall_memory::{
    AdapterResponse, Config, Embedder, InMemoryStore, MemoryFacade, MemoryStore, Message,
    SqliteMemoryStore,
};
use serde_json::Value;

/// Answers with a fixed text and keeps every prompt it was sent
struct StubLlm {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    fn answering(answer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

struct DownLlm;

#[async_trait]
impl LlmClient for DownLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::llm("connection refused"))
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}

/// Memory store that is never reachable
struct UnreachableStore;

#[async_trait]
impl MemoryStore for UnreachableStore {
    async fn add(&self, _messages: Vec<Message>, _user_id: &str) -> recall_memory::Result<Value> {
        Err(recall_memory::Error::connectivity("connection refused"))
    }

    async fn search(
        &self,
        _query: &str,
        _user_id: &str,
        _limit: usize,
    ) -> recall_memory::Result<AdapterResponse> {
        Err(recall_memory::Error::connectivity("connection refused"))
    }

    async fn get_all(&self, _user_id: &str) -> recall_memory::Result<AdapterResponse> {
        Err(recall_memory::Error::connectivity("connection refused"))
    }
}

/// Letter-frequency vectors; enough to rank identical text first
struct LetterEmbedder;

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> recall_memory::Result<Vec<f32>> {
        let mut v = vec![0.0; 26];
        for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        26
    }
}

fn orchestrator(
    store: Arc<dyn MemoryStore>,
    llm: Arc<dyn LlmClient>,
    persistence: PersistencePolicy,
) -> ChatOrchestrator {
    ChatOrchestrator::new(
        MemoryFacade::new(store, "user"),
        llm,
        ChatOptions::new(3, persistence).unwrap(),
    )
}

// ---- Degradation ----

#[tokio::test]
async fn test_unreachable_memory_still_answers() {
    let mut chat = orchestrator(
        Arc::new(UnreachableStore),
        StubLlm::answering("Rust is a systems language."),
        PersistencePolicy::Always,
    );

    let reply = chat.chat("What is Rust?").await;

    assert_eq!(reply.answer, "Rust is a systems language.");
    assert!(!reply.used_context);
    assert!(reply.context.is_empty());
    assert!(matches!(reply.persisted, PersistOutcome::Failed(_)));
    assert_eq!(reply.warnings.len(), 2, "{:?}", reply.warnings);
    assert_eq!(chat.stats().total_questions, 1);
}

#[tokio::test]
async fn test_generation_failure_is_reported_and_not_saved() {
    let store = Arc::new(InMemoryStore::new());
    let mut chat = orchestrator(store.clone(), Arc::new(DownLlm), PersistencePolicy::Always);

    let reply = chat.chat("I like pasta").await;

    assert_eq!(
        reply.answer,
        "Error communicating with stub-model: LLM error: connection refused"
    );
    assert_eq!(reply.persisted, PersistOutcome::Skipped);
    assert!(store.is_empty());

    let history = chat.history(5);
    assert_eq!(history.len(), 1);
    assert!(!history[0].used_context);
}

// ---- Retrieval ----

#[tokio::test]
async fn test_saved_name_is_injected_as_context() {
    let store = Arc::new(InMemoryStore::new());
    let memory = MemoryFacade::new(store.clone(), "user");
    memory.save("My name is Alex").await.unwrap();
    memory.save("I like pasta").await.unwrap();

    let llm = StubLlm::answering("Your name is Alex.");
    let mut chat = orchestrator(store, llm.clone(), PersistencePolicy::Never);

    let reply = chat.chat("What is the user's name?").await;

    assert!(reply.used_context);
    assert_eq!(reply.context.first().map(String::as_str), Some("My name is Alex"));

    let prompt = llm.last_prompt();
    assert!(prompt.contains("Relevant context from previous memories:\n1. My name is Alex"));
    assert!(prompt.contains("User question: What is the user's name?"));
}

#[tokio::test]
async fn test_context_limit_caps_retrieval() {
    let store = Arc::new(InMemoryStore::new());
    let memory = MemoryFacade::new(store.clone(), "user");
    for i in 0..6 {
        memory.save(&format!("pasta fact {i}")).await.unwrap();
    }

    let mut chat = ChatOrchestrator::new(
        memory,
        StubLlm::answering("ok"),
        ChatOptions::new(3, PersistencePolicy::Never).unwrap(),
    );

    let reply = chat.chat("pasta").await;
    assert_eq!(reply.context, vec!["pasta fact 0", "pasta fact 1", "pasta fact 2"]);
}

// ---- Persistence ----

#[tokio::test]
async fn test_heuristic_saves_only_personal_statements() {
    let store = Arc::new(InMemoryStore::new());
    let mut chat = orchestrator(
        store.clone(),
        StubLlm::answering("Noted."),
        PersistencePolicy::Heuristic,
    );

    let reply = chat.chat("I like pasta").await;
    assert_eq!(reply.persisted, PersistOutcome::Saved);
    assert_eq!(store.len(), 1);

    let reply = chat.chat("What time is it?").await;
    assert_eq!(reply.persisted, PersistOutcome::Skipped);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_long_answers_are_saved_truncated() {
    let store = Arc::new(InMemoryStore::new());
    let long_answer = "x".repeat(800);
    let mut chat = orchestrator(
        store.clone(),
        StubLlm::answering(long_answer.clone()),
        PersistencePolicy::Always,
    );

    let reply = chat.chat("Tell me a long story").await;
    assert_eq!(reply.answer, long_answer);

    let saved = MemoryFacade::new(store, "user").get_all().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].contains("] Conversation:\nQuestion: Tell me a long story\nAnswer: "));
    assert!(saved[0].ends_with(&format!("{}...", "x".repeat(500))));
    assert!(!saved[0].contains(&"x".repeat(501)));
}

#[tokio::test]
async fn test_conversations_survive_reopening_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_database_path(dir.path().join("memories.db"));

    {
        let store = SqliteMemoryStore::open(&config, Arc::new(LetterEmbedder)).unwrap();
        let mut chat = orchestrator(
            Arc::new(store),
            StubLlm::answering("Pasta is great."),
            PersistencePolicy::Always,
        );
        assert_eq!(chat.chat("I like pasta").await.persisted, PersistOutcome::Saved);
    }

    let store = SqliteMemoryStore::open(&config, Arc::new(LetterEmbedder)).unwrap();
    let llm = StubLlm::answering("You like pasta.");
    let mut chat = orchestrator(Arc::new(store), llm.clone(), PersistencePolicy::Never);

    let reply = chat.chat("What food do I like?").await;
    assert!(reply.used_context);
    assert!(llm.last_prompt().contains("Question: I like pasta"));
}

// ---- Session ----

#[tokio::test]
async fn test_stats_and_history_follow_turns() {
    let store = Arc::new(InMemoryStore::new());
    let mut chat = orchestrator(store, StubLlm::answering("ok"), PersistencePolicy::Always);

    assert_eq!(chat.stats().context_usage_rate, "0%");

    chat.chat("I like pasta").await; // nothing stored yet, no context
    chat.chat("pasta again").await; // finds the saved conversation
    chat.chat("zzzz").await;

    let stats = chat.stats();
    assert_eq!(stats.total_questions, 3);
    assert_eq!(stats.questions_with_context, 1);
    assert_eq!(stats.context_usage_rate, "33.3%");

    let last_two: Vec<&str> = chat
        .history(2)
        .iter()
        .map(|t| t.user_utterance.as_str())
        .collect();
    assert_eq!(last_two, vec!["pasta again", "zzzz"]);
    assert_eq!(chat.history(10).len(), 3);
}
