//! Memory access facade shared by the HTTP API and the chat clients

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::memory::MemoryStore;
use crate::message::Message;

/// Longest text echoed back in a save acknowledgement
const ACK_PREVIEW_CHARS: usize = 100;

/// Acknowledgement for a successful save
#[derive(Debug, Clone, Serialize)]
pub struct SaveAck {
    pub message: String,
    /// Whatever the store answered, untouched
    pub result: Value,
}

/// Normalizes a [`MemoryStore`] into plain memory strings for one fixed user.
///
/// Each call reaches the store exactly once; nothing is cached or retried.
#[derive(Clone)]
pub struct MemoryFacade {
    store: Arc<dyn MemoryStore>,
    user_id: String,
}

impl MemoryFacade {
    pub fn new(store: Arc<dyn MemoryStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Store `text` as a single user message. Blank text never reaches the store.
    pub async fn save(&self, text: &str) -> Result<SaveAck> {
        if text.trim().is_empty() {
            return Err(Error::invalid_input("memory text must not be blank"));
        }

        let result = self
            .store
            .add(vec![Message::user(text)], &self.user_id)
            .await?;

        tracing::debug!(user_id = %self.user_id, chars = text.chars().count(), "Saved memory");

        Ok(SaveAck {
            message: format!("Successfully saved memory: {}", preview(text, ACK_PREVIEW_CHARS)),
            result,
        })
    }

    /// Most relevant memories first, at most `limit` of them
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        if limit == 0 {
            return Err(Error::invalid_input("search limit must be at least 1"));
        }

        let response = self.store.search(query, &self.user_id, limit).await?;
        let mut memories = response.into_texts()?;
        memories.truncate(limit);

        tracing::debug!(user_id = %self.user_id, found = memories.len(), "Searched memories");
        Ok(memories)
    }

    /// Every memory in store order
    pub async fn get_all(&self) -> Result<Vec<String>> {
        self.store.get_all(&self.user_id).await?.into_texts()
    }
}

/// First `max_chars` characters of `text`, with `...` appended when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{AdapterResponse, MemoryRecord, ResultsEnvelope};
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers every read with a canned shape and remembers what it was sent
    struct CannedStore {
        response: AdapterResponse,
        added: Mutex<Vec<(Vec<Message>, String)>>,
    }

    impl CannedStore {
        fn new(response: AdapterResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                added: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MemoryStore for CannedStore {
        async fn add(&self, messages: Vec<Message>, user_id: &str) -> Result<Value> {
            self.added.lock().unwrap().push((messages, user_id.to_string()));
            Ok(json!({"results": [{"id": "m-1", "event": "ADD"}]}))
        }

        async fn search(&self, _query: &str, _user_id: &str, _limit: usize) -> Result<AdapterResponse> {
            Ok(self.response.clone())
        }

        async fn get_all(&self, _user_id: &str) -> Result<AdapterResponse> {
            Ok(self.response.clone())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl MemoryStore for BrokenStore {
        async fn add(&self, _messages: Vec<Message>, _user_id: &str) -> Result<Value> {
            Err(Error::storage("disk full"))
        }

        async fn search(&self, _query: &str, _user_id: &str, _limit: usize) -> Result<AdapterResponse> {
            Err(Error::connectivity("connection refused"))
        }

        async fn get_all(&self, _user_id: &str) -> Result<AdapterResponse> {
            Err(Error::connectivity("connection refused"))
        }
    }

    fn records(texts: &[&str]) -> Vec<MemoryRecord> {
        texts.iter().map(|t| MemoryRecord::new(*t)).collect()
    }

    #[tokio::test]
    async fn save_sends_one_user_message_for_the_fixed_user() {
        let store = CannedStore::new(AdapterResponse::Texts(vec![]));
        let facade = MemoryFacade::new(store.clone(), "user");

        let ack = facade.save("I like pasta").await.unwrap();

        assert_eq!(ack.message, "Successfully saved memory: I like pasta");
        assert_eq!(ack.result["results"][0]["event"], "ADD");
        let added = store.added.lock().unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].0, vec![Message::user("I like pasta")]);
        assert_eq!(added[0].1, "user");
    }

    #[tokio::test]
    async fn save_ack_previews_long_text() {
        let facade = MemoryFacade::new(CannedStore::new(AdapterResponse::Texts(vec![])), "user");
        let text = "x".repeat(150);

        let ack = facade.save(&text).await.unwrap();

        assert_eq!(
            ack.message,
            format!("Successfully saved memory: {}...", "x".repeat(100))
        );
    }

    #[tokio::test]
    async fn every_shape_normalizes_to_the_same_texts() {
        let shapes = [
            AdapterResponse::Records(records(&["a", "b", "c"])),
            AdapterResponse::Envelope(ResultsEnvelope {
                results: records(&["a", "b", "c"]),
            }),
            AdapterResponse::Texts(vec!["a".into(), "b".into(), "c".into()]),
        ];

        for shape in shapes {
            let facade = MemoryFacade::new(CannedStore::new(shape), "user");
            assert_eq!(facade.search("q", 5).await.unwrap(), vec!["a", "b", "c"]);
            assert_eq!(facade.get_all().await.unwrap(), vec!["a", "b", "c"]);
        }
    }

    #[tokio::test]
    async fn search_never_exceeds_limit_and_keeps_order() {
        let facade = MemoryFacade::new(
            CannedStore::new(AdapterResponse::Records(records(&["first", "second", "third"]))),
            "user",
        );

        assert_eq!(facade.search("q", 2).await.unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn zero_limit_is_rejected() {
        let facade = MemoryFacade::new(Arc::new(InMemoryStore::new()), "user");
        let err = facade.search("q", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_the_store() {
        let store = CannedStore::new(AdapterResponse::Texts(vec![]));
        let facade = MemoryFacade::new(store.clone(), "user");

        let err = facade.save(" \n\t ").await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.added.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_shape_is_an_error() {
        let facade = MemoryFacade::new(
            CannedStore::new(AdapterResponse::Unrecognized(json!({"memories": 3}))),
            "user",
        );

        assert!(matches!(
            facade.search("q", 3).await,
            Err(Error::MalformedResponse(_))
        ));
        assert!(matches!(facade.get_all().await, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn store_failures_come_back_as_errors() {
        let facade = MemoryFacade::new(Arc::new(BrokenStore), "user");

        assert!(matches!(facade.save("x").await, Err(Error::Storage(_))));
        assert!(facade.search("x", 3).await.unwrap_err().is_connectivity());
        assert!(facade.get_all().await.unwrap_err().is_connectivity());
    }

    #[tokio::test]
    async fn saved_texts_all_come_back() {
        let facade = MemoryFacade::new(Arc::new(InMemoryStore::new()), "user");
        let texts = ["I like pasta", "My name is Alex", "I live in Haifa", "I like pasta"];

        for text in texts {
            facade.save(text).await.unwrap();
        }

        let all = facade.get_all().await.unwrap();
        for text in texts {
            assert!(all.iter().any(|m| m == text), "missing {text}");
        }
        assert_eq!(all.len(), texts.len());
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        assert_eq!(preview("שלום עולם", 4), "שלום...");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exact", 5), "exact");
    }
}
