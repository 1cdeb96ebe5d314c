//! Ephemeral store with substring relevance

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::memory::{AdapterResponse, MemoryRecord, MemoryStore};
use crate::message::Message;

/// Keeps records for the life of the process.
///
/// A record's relevance is the number of distinct query words (two or more
/// characters, case-insensitive) that occur anywhere in its text. Records
/// scoring zero are not returned.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn for_user(&self, user_id: &str) -> Result<Vec<MemoryRecord>> {
        let records = self.records.lock().map_err(|e| Error::storage(e.to_string()))?;
        Ok(records
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect())
    }
}

fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
    {
        let word = word.to_lowercase();
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn add(&self, messages: Vec<Message>, user_id: &str) -> Result<Value> {
        let mut records = self.records.lock().map_err(|e| Error::storage(e.to_string()))?;
        let mut results = Vec::new();

        for message in messages.into_iter().filter(|m| !m.content.trim().is_empty()) {
            let id = Uuid::new_v4().to_string();
            results.push(json!({"id": id, "memory": message.content, "event": "ADD"}));
            records.push(
                MemoryRecord::new(message.content)
                    .with_id(id)
                    .with_user(user_id)
                    .with_created_at(Utc::now()),
            );
        }

        if results.is_empty() {
            return Err(Error::invalid_input("no non-empty message to store"));
        }

        Ok(json!({ "results": results }))
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<AdapterResponse> {
        let terms = query_terms(query);

        let mut scored: Vec<(usize, MemoryRecord)> = self
            .for_user(user_id)?
            .into_iter()
            .filter_map(|record| {
                let text = record.memory.to_lowercase();
                let hits = terms.iter().filter(|t| text.contains(t.as_str())).count();
                (hits > 0).then(|| (hits, record))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(AdapterResponse::Records(
            scored
                .into_iter()
                .take(limit)
                .map(|(hits, record)| record.with_score(hits as f32))
                .collect(),
        ))
    }

    async fn get_all(&self, user_id: &str) -> Result<AdapterResponse> {
        Ok(AdapterResponse::Records(self.for_user(user_id)?))
    }
}
