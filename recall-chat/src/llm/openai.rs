use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use recall_memory::facade::preview;

use super::{LlmClient, PROVIDER_ERROR_CHARS};
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Any OpenAI-compatible `/v1/chat/completions` endpoint
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: Option<String>,
        model: String,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
            api_key,
            temperature,
            max_tokens,
            http_client,
        }
    }

    fn build_request_body(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut http_req = self
            .http_client
            .post(&url)
            .json(&self.build_request_body(prompt));
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| Error::llm(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "OpenAI API error {status}: {}",
                preview(&body_text, PROVIDER_ERROR_CHARS)
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("Failed to parse OpenAI response: {e}")))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str, api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(
            reqwest::Client::new(),
            Some(base.to_string()),
            "llama3".to_string(),
            api_key.map(str::to_string),
            0.2,
            512,
        )
    }

    #[test]
    fn request_body_matches_openai_format() {
        let body = client(DEFAULT_BASE_URL, None).build_request_body("Hello");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "llama3");
        assert_eq!(json["max_tokens"], 512);
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Hello");
    }

    #[tokio::test]
    async fn generate_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3",
                "choices": [{"message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client(&server.uri(), Some("sk-test"))
            .generate("Hello")
            .await
            .unwrap();
        assert_eq!(answer, "Hi!");
    }

    #[tokio::test]
    async fn null_content_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri(), None).generate("Hello").await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[tokio::test]
    async fn server_errors_are_llm_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(&server.uri(), None).generate("Hello").await.unwrap_err();
        assert!(matches!(err, Error::Llm(ref m) if m.contains("500") && m.contains("overloaded")));
    }
}
