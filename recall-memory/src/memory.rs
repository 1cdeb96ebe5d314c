//! Memory records, adapter responses and the store capability

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::message::Message;

/// A persisted memory as reported by a store.
///
/// Only `memory` is required; stores attach whatever else they keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Store-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The memory text
    pub memory: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Relevance score, present on search results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl MemoryRecord {
    pub fn new(memory: impl Into<String>) -> Self {
        Self {
            id: None,
            memory: memory.into(),
            user_id: None,
            score: None,
            created_at: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// `{"results": [...]}` wrapper some stores answer with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsEnvelope {
    pub results: Vec<MemoryRecord>,
}

/// The shapes a store may answer `search`/`get_all` with
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterResponse {
    /// A bare list of record objects
    Records(Vec<MemoryRecord>),

    /// A wrapper object with a `results` list
    Envelope(ResultsEnvelope),

    /// An already-flat list of memory strings
    Texts(Vec<String>),

    /// Anything else, kept verbatim for the error message
    Unrecognized(Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KnownShape {
    Texts(Vec<String>),
    Records(Vec<MemoryRecord>),
    Envelope(ResultsEnvelope),
}

impl AdapterResponse {
    /// Classify a raw JSON answer
    pub fn from_value(value: Value) -> Self {
        match KnownShape::deserialize(&value) {
            Ok(KnownShape::Texts(texts)) => AdapterResponse::Texts(texts),
            Ok(KnownShape::Records(records)) => AdapterResponse::Records(records),
            Ok(KnownShape::Envelope(envelope)) => AdapterResponse::Envelope(envelope),
            Err(_) => AdapterResponse::Unrecognized(value),
        }
    }

    /// Flatten to memory strings, keeping the store's order
    pub fn into_texts(self) -> Result<Vec<String>> {
        match self {
            AdapterResponse::Records(records)
            | AdapterResponse::Envelope(ResultsEnvelope { results: records }) => {
                Ok(records.into_iter().map(|r| r.memory).collect())
            }
            AdapterResponse::Texts(texts) => Ok(texts),
            AdapterResponse::Unrecognized(value) => {
                let mut preview = value.to_string();
                if preview.len() > 200 {
                    let cut = (0..=200).rev().find(|i| preview.is_char_boundary(*i)).unwrap_or(0);
                    preview.truncate(cut);
                    preview.push_str("...");
                }
                Err(Error::malformed(format!(
                    "unrecognized memory store response: {preview}"
                )))
            }
        }
    }
}

/// Capability set of a memory library.
///
/// `add` returns the store's own acknowledgement verbatim.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn add(&self, messages: Vec<Message>, user_id: &str) -> Result<Value>;

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<AdapterResponse>;

    async fn get_all(&self, user_id: &str) -> Result<AdapterResponse>;
}
