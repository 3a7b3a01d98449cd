use crate::{ChatGateway, ChatMessage, GatewayError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "falcon-h1-7b-instruct".to_string(),
            temperature: 0.5,
        }
    }
}

/// Chat-completion client speaking the OpenAI-style wire contract.
pub struct CompletionClient {
    client: Arc<Client>,
    config: CompletionConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionTurn,
}

#[derive(Debug, Deserialize)]
struct CompletionTurn {
    content: Option<String>,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            client: Arc::new(Client::new()),
            config,
        }
    }
}

#[async_trait]
impl ChatGateway for CompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&json!({
                "model": self.config.model,
                "messages": messages,
                "temperature": self.config.temperature,
            }))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        if !response.status().is_success() {
            return Err(GatewayError::BackendProtocolError(format!(
                "completion request returned {}",
                response.status()
            )));
        }

        let envelope: CompletionEnvelope = response
            .json()
            .await
            .map_err(|error| GatewayError::BackendProtocolError(error.to_string()))?;

        reply_text(envelope)
    }
}

fn reply_text(envelope: CompletionEnvelope) -> Result<String, GatewayError> {
    envelope
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            GatewayError::BackendProtocolError("completion response has no message text".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::{reply_text, CompletionEnvelope};

    #[test]
    fn reply_text_takes_first_choice_and_trims() {
        let envelope: CompletionEnvelope = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  PRODUCT \n"}},
                            {"message": {"role": "assistant", "content": "ignored"}}]}"#,
        )
        .expect("envelope should parse");

        assert_eq!(reply_text(envelope).expect("text expected"), "PRODUCT");
    }

    #[test]
    fn reply_text_rejects_empty_choice_list() {
        let envelope: CompletionEnvelope =
            serde_json::from_str(r#"{"choices": []}"#).expect("envelope should parse");

        assert!(reply_text(envelope).is_err());
    }

    #[test]
    fn reply_text_rejects_missing_content() {
        let envelope: CompletionEnvelope =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant"}}]}"#)
                .expect("envelope should parse");

        assert!(reply_text(envelope).is_err());
    }
}
