//! Language model gateway.
//!
//! [`LanguageModel`] is the only way the rest of the crate produces text.
//! The production implementation, [`LlamaServerModel`], talks to a locally
//! hosted llama.cpp server through its OpenAI-style chat completions
//! endpoint. Requests are plain async HTTP, so a long inference never ties
//! up a runtime worker.
//!
//! There are no retries: a failed or malformed response is returned to the
//! caller as [`RagError::ModelInference`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::ModelConfig;
use crate::error::{RagError, Result};
use crate::models::ChatMessage;

/// Sampling temperature used for translation prompts.
pub const TRANSLATION_TEMPERATURE: f32 = 0.1;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate the assistant reply for `messages`.
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// Sampling temperature for [`translate`](LanguageModel::translate).
    fn translation_temperature(&self) -> f32 {
        TRANSLATION_TEMPERATURE
    }

    /// Ask the model to translate `text` into `target_language`.
    ///
    /// This is a prompt, not a translation engine: whatever the model
    /// replies is returned, minus surrounding whitespace and quotes.
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let messages = [ChatMessage::user(translation_prompt(text, target_language))];
        let reply = self
            .complete(&messages, self.translation_temperature())
            .await?;
        Ok(clean_translation(&reply))
    }
}

pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text to {}. ONLY output the translation and nothing else. Text: \"{}\"",
        target_language, text
    )
}

fn clean_translation(reply: &str) -> String {
    reply.trim().trim_matches('"').to_string()
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Client for a llama.cpp-compatible `/v1/chat/completions` endpoint.
pub struct LlamaServerModel {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
    translation_temperature: f32,
}

impl LlamaServerModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        if !config.path.exists() {
            tracing::warn!(
                path = %config.path.display(),
                "model file not found on this host; completions depend on the server at {}",
                config.endpoint
            );
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(RagError::internal)?;

        Ok(Self {
            client,
            url: format!(
                "{}/v1/chat/completions",
                config.endpoint.trim_end_matches('/')
            ),
            model: config.model_name(),
            max_tokens: config.max_tokens,
            translation_temperature: config.translation_temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for LlamaServerModel {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        tracing::debug!(url = %self.url, messages = messages.len(), temperature, "requesting completion");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::ModelInference(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::ModelInference(format!(
                "LLM request failed: {} {}",
                status, text
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RagError::ModelInference(format!("invalid response body: {}", e)))?;

        extract_content(&payload).ok_or_else(|| {
            RagError::ModelInference("response contained no completion text".to_string())
        })
    }

    fn translation_temperature(&self) -> f32 {
        self.translation_temperature
    }
}

/// Pull the generated text out of a chat (or legacy completion) response.
fn extract_content(payload: &Value) -> Option<String> {
    let choice = payload.get("choices")?.as_array()?.first()?;
    choice
        .get("message")
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
        .or_else(|| choice.get("text").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct Echo {
        reply: String,
        seen: Mutex<Vec<(Vec<ChatMessage>, f32)>>,
    }

    #[async_trait]
    impl LanguageModel for Echo {
        async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), temperature));
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_extract_chat_content() {
        let payload = json!({"choices": [{"message": {"role": "assistant", "content": "Hola"}}]});
        assert_eq!(extract_content(&payload).as_deref(), Some("Hola"));
    }

    #[test]
    fn test_extract_legacy_text() {
        let payload = json!({"choices": [{"text": "plain"}]});
        assert_eq!(extract_content(&payload).as_deref(), Some("plain"));
    }

    #[test]
    fn test_extract_missing() {
        assert!(extract_content(&json!({"choices": []})).is_none());
        assert!(extract_content(&json!({"error": "oops"})).is_none());
    }

    #[test]
    fn test_request_shape() {
        let messages = [ChatMessage::system("s"), ChatMessage::user("u")];
        let body = serde_json::to_value(CompletionRequest {
            model: "model_1",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 1024,
            stream: false,
        })
        .unwrap();
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn test_translate_prompt_and_cleanup() {
        let model = Echo {
            reply: "  \"¿Qué es esto?\"\n".to_string(),
            seen: Mutex::new(Vec::new()),
        };

        let out = model.translate("Què és això?", "Spanish").await.unwrap();
        assert_eq!(out, "¿Qué es esto?");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (messages, temperature) = &seen[0];
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("to Spanish"));
        assert!(messages[0].content.contains("\"Què és això?\""));
        assert!((*temperature - TRANSLATION_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_endpoint_url_normalized() {
        let config = ModelConfig {
            endpoint: "http://127.0.0.1:8080/".to_string(),
            ..ModelConfig::default()
        };
        let model = LlamaServerModel::new(&config).unwrap();
        assert_eq!(model.url, "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(model.model, "model_1");
    }
}
