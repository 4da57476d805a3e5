mod client;
pub(crate) mod types;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AiError, Result};
use crate::traits::{ChatModel, Message};

use client::MinoClient;

pub const DEFAULT_ENDPOINT: &str = "https://api.mino.ai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mino-latest";

const PREAMBLE: &str = "You are a precise classifier. Output JSON only, no markdown.";
const TEMPERATURE: f32 = 0.2;

// =============================================================================
// Mino Agent
// =============================================================================

#[derive(Clone)]
pub struct Mino {
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl Mino {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Upper bound for a single call, network and model time included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn client(&self) -> Result<MinoClient> {
        if self.api_key.is_empty() {
            return Err(AiError::Config("Missing MINO_API_KEY".to_string()));
        }
        MinoClient::new(&self.api_key, &self.endpoint, self.timeout)
    }
}

#[async_trait]
impl ChatModel for Mino {
    async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let request = types::ChatRequest::new(&self.model)
            .messages(messages.into_iter().map(types::WireMessage::from))
            .temperature(TEMPERATURE);

        let client = self.client()?;
        match tokio::time::timeout(self.timeout, client.chat(&request)).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout(self.timeout)),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(vec![Message::system(PREAMBLE), Message::user(prompt)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ChatResponse;

    #[test]
    fn test_mino_new() {
        let ai = Mino::new("mk-test", "mino-latest");
        assert_eq!(ai.model, "mino-latest");
        assert_eq!(ai.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(ai.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_mino_with_endpoint() {
        let ai = Mino::new("mk-test", "mino-latest").with_endpoint("https://custom.api.com/chat");
        assert_eq!(ai.endpoint, "https://custom.api.com/chat");
    }

    #[test]
    fn missing_key_is_config_error() {
        let ai = Mino::new("", "mino-latest");
        assert!(matches!(ai.client(), Err(AiError::Config(_))));
    }

    #[test]
    fn request_carries_fixed_preamble_and_temperature() {
        let request = types::ChatRequest::new("mino-latest")
            .messages(
                [Message::system(PREAMBLE), Message::user("classify")]
                    .into_iter()
                    .map(types::WireMessage::from),
            )
            .temperature(TEMPERATURE);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], PREAMBLE);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["temperature"].as_f64().map(|t| (t * 10.0).round()), Some(2.0));
    }

    #[test]
    fn response_prefers_first_choice() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}],"content":"other"}"#,
        )
        .unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn response_falls_back_to_top_level_content() {
        let resp: ChatResponse = serde_json::from_str(r#"{"content":"{\"b\":2}"}"#).unwrap();
        assert_eq!(resp.into_text().as_deref(), Some("{\"b\":2}"));
    }

    #[test]
    fn response_without_content_yields_none() {
        let resp: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(resp.into_text(), None);
    }
}
