//! SQLite-backed memory store with embedding similarity search

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::{cosine_similarity, decode_embedding, encode_embedding, Embedder};
use crate::error::{Error, Result};
use crate::memory::{AdapterResponse, MemoryRecord, MemoryStore, ResultsEnvelope};
use crate::message::Message;

/// Durable local store.
///
/// Search embeds the query and scans the user's rows by cosine similarity;
/// it answers with a `{"results": [...]}` envelope. `get_all` answers with a
/// bare record list in insertion order.
pub struct SqliteMemoryStore {
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn Embedder>,
}

impl SqliteMemoryStore {
    /// Open (or create) the database at `config.database_path`
    pub fn open(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.ensure_dirs()?;
        let conn = Connection::open(config.database_path())?;
        Self::with_connection(conn, embedder)
    }

    /// Throwaway database, mostly for tests
    pub fn open_in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn Embedder>) -> Result<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    /// Number of memories stored for a user
    pub fn count(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM memories WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert(&self, row: &MemoryRow) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO memories (id, user_id, role, memory, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                row.id,
                row.user_id,
                row.role,
                row.memory,
                row.embedding,
                row.created_at,
            ],
        )?;

        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Vec<MemoryRow>> {
        let conn = self.conn.lock().map_err(|e| Error::storage(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, role, memory, embedding, created_at
            FROM memories WHERE user_id = ?1
            ORDER BY seq ASC
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(MemoryRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                role: row.get(2)?,
                memory: row.get(3)?,
                embedding: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Error::from)
    }

    /// Embed `text`, refusing vectors the embedder did not promise
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.embedder.embed(text).await?;
        let expected = self.embedder.dimensions();
        if embedding.len() != expected {
            return Err(Error::embedding(format!(
                "expected {expected} dimensions, got {}",
                embedding.len()
            )));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn add(&self, messages: Vec<Message>, user_id: &str) -> Result<Value> {
        let mut results = Vec::new();

        for message in messages.into_iter().filter(|m| !m.content.trim().is_empty()) {
            // Embed before taking the connection lock
            let embedding = self.embed(&message.content).await?;

            let row = MemoryRow {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                role: message.role.to_string(),
                memory: message.content,
                embedding: encode_embedding(&embedding),
                created_at: Utc::now().to_rfc3339(),
            };
            self.insert(&row)?;

            tracing::debug!(id = %row.id, user_id, "Stored memory");
            results.push(json!({"id": row.id, "memory": row.memory, "event": "ADD"}));
        }

        if results.is_empty() {
            return Err(Error::invalid_input("no non-empty message to store"));
        }

        Ok(json!({ "results": results }))
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<AdapterResponse> {
        let query_embedding = self.embed(query).await?;

        let mut scored = Vec::new();
        for row in self.load(user_id)? {
            let embedding = decode_embedding(&row.embedding)?;
            // Rows written by a different embedding model are not comparable
            if embedding.len() != query_embedding.len() {
                tracing::warn!(
                    id = %row.id,
                    dimensions = embedding.len(),
                    expected = query_embedding.len(),
                    "Skipping memory with mismatched embedding"
                );
                continue;
            }
            let score = cosine_similarity(&query_embedding, &embedding);
            scored.push(row.into_record()?.with_score(score));
        }

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(AdapterResponse::Envelope(ResultsEnvelope { results: scored }))
    }

    async fn get_all(&self, user_id: &str) -> Result<AdapterResponse> {
        let records = self
            .load(user_id)?
            .into_iter()
            .map(MemoryRow::into_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(AdapterResponse::Records(records))
    }
}

/// Intermediate struct for reading from SQLite
struct MemoryRow {
    id: String,
    user_id: String,
    role: String,
    memory: String,
    embedding: Vec<u8>,
    created_at: String,
}

impl MemoryRow {
    fn into_record(self) -> Result<MemoryRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::storage(e.to_string()))?;

        let mut record = MemoryRecord::new(self.memory)
            .with_id(self.id)
            .with_user(self.user_id)
            .with_created_at(created_at);
        record.metadata = Some(json!({ "role": self.role }));
        Ok(record)
    }
}
