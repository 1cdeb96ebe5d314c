//! LLM clients used to generate chat answers

mod gemini;
mod openai;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

/// One-shot text generation
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Answer text for `prompt`; empty output is [`Error::EmptyResponse`]
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Characters of a provider error body kept in the error message
const PROVIDER_ERROR_CHARS: usize = 300;

pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let http = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

    let client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "gemini" => Arc::new(GeminiClient::new(
            http,
            config.api_url.clone(),
            config.model.clone(),
            config.require_api_key()?.to_string(),
            config.temperature,
            config.max_tokens,
        )),
        "openai" => Arc::new(OpenAiClient::new(
            http,
            config.api_url.clone(),
            config.model.clone(),
            config.api_key.clone(),
            config.temperature,
            config.max_tokens,
        )),
        other => {
            return Err(Error::config(format!("Unknown LLM provider: {other}")));
        }
    };

    tracing::debug!(provider = %config.provider, model = %config.model, "LLM client ready");
    Ok(client)
}
