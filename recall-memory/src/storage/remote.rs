//! Memory store reached through the recall HTTP API

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::memory::{AdapterResponse, MemoryStore};
use crate::message::Message;
use crate::server::{
    ErrorResponse, HealthResponse, SaveMemoryRequest, SaveMemoryResponse, SearchMemoriesRequest,
};

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a running `recall-memory-server`.
///
/// The server owns the user scope, so the `user_id` handed to this store is
/// only logged. `search`/`get_all` answer with flat string lists.
pub struct HttpMemoryStore {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct RawMemoriesResponse {
    success: bool,
    #[serde(default)]
    memories: Value,
}

impl HttpMemoryStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Health check via `GET /`
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self.http.get(self.url("/")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Turn non-2xx answers into [`Error::Http`], carrying the server's `detail`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);

        Err(Error::Http {
            status: status.as_u16(),
            detail,
        })
    }

    async fn memories(&self, response: reqwest::Response) -> Result<AdapterResponse> {
        let body: RawMemoriesResponse = Self::check(response).await?.json().await?;
        if !body.success {
            return Err(Error::malformed("memory service reported success=false"));
        }
        Ok(AdapterResponse::from_value(body.memories))
    }
}

#[async_trait]
impl MemoryStore for HttpMemoryStore {
    async fn add(&self, messages: Vec<Message>, user_id: &str) -> Result<Value> {
        let text = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(url = %self.base_url, user_id, "Saving memory remotely");

        let response = self
            .http
            .post(self.url("/save_memory"))
            .json(&SaveMemoryRequest { text })
            .send()
            .await?;

        let body: SaveMemoryResponse = Self::check(response).await?.json().await?;
        Ok(body.result)
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<AdapterResponse> {
        tracing::debug!(url = %self.base_url, user_id, limit, "Searching memories remotely");

        let response = self
            .http
            .post(self.url("/search_memories"))
            .json(&SearchMemoriesRequest {
                query: query.to_string(),
                limit: Some(limit),
            })
            .send()
            .await?;

        self.memories(response).await
    }

    async fn get_all(&self, user_id: &str) -> Result<AdapterResponse> {
        tracing::debug!(url = %self.base_url, user_id, "Fetching all memories remotely");

        let response = self.http.get(self.url("/get_all_memories")).send().await?;
        self.memories(response).await
    }
}
