//! HTTP client for OpenAI-compatible chat completion APIs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{AssistantResult, ChatBackend, ChatMessage};
use crate::config::Config;
use crate::error::AssistantError;

const COMPLETIONS_PATH: &str = "chat/completions";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model: &'a str,
  messages: &'a [ChatMessage],
  temperature: f32,
  max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  #[serde(default)]
  content: Option<String>,
}

impl CompletionResponse {
  fn into_answer(self) -> AssistantResult<String> {
    self
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .filter(|content| !content.trim().is_empty())
      .ok_or(AssistantError::EmptyResponse)
  }
}

pub struct OpenAiClient {
  client: Client,
  endpoint: Url,
  api_key: String,
  model: String,
  temperature: f32,
  max_tokens: u32,
}

impl OpenAiClient {
  /// Build a client from config. A missing or blank key is an error here
  /// rather than on the first request.
  pub fn from_config(config: &Config, api_key: Option<&str>) -> AssistantResult<Self> {
    let api_key = api_key
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .ok_or(AssistantError::MissingApiKey)?;

    let endpoint = config
      .api_base_url()
      .and_then(|base| base.join(COMPLETIONS_PATH))
      .map_err(|e| AssistantError::request_failed(format!("invalid API base: {e}")))?;

    let client = Client::builder()
      .timeout(Duration::from_secs(config.llm.timeout_secs))
      .build()
      .map_err(|e| AssistantError::request_failed(e.to_string()))?;

    Ok(Self {
      client,
      endpoint,
      api_key: api_key.to_string(),
      model: config.llm.model.clone(),
      temperature: config.llm.temperature,
      max_tokens: config.llm.max_tokens,
    })
  }

  pub fn endpoint(&self) -> &Url {
    &self.endpoint
  }

  pub fn model(&self) -> &str {
    &self.model
  }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
  async fn complete(&self, messages: &[ChatMessage]) -> AssistantResult<String> {
    let request = CompletionRequest {
      model: &self.model,
      messages,
      temperature: self.temperature,
      max_tokens: self.max_tokens,
    };

    tracing::debug!(
      endpoint = %self.endpoint,
      model = %self.model,
      messages = messages.len(),
      "sending completion request"
    );
    let response = self
      .client
      .post(self.endpoint.clone())
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| AssistantError::request_failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(AssistantError::Http { status: status.as_u16(), body });
    }

    let completion: CompletionResponse =
      response.json().await.map_err(|e| AssistantError::request_failed(e.to_string()))?;
    completion.into_answer()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_key_is_rejected() {
    let config = Config::default();
    assert!(matches!(OpenAiClient::from_config(&config, None), Err(AssistantError::MissingApiKey)));
    assert!(matches!(
      OpenAiClient::from_config(&config, Some("  ")),
      Err(AssistantError::MissingApiKey)
    ));
  }

  #[test]
  fn test_endpoint_keeps_base_path() {
    let mut config = Config::default();
    config.llm.api_base = "http://localhost:11434/v1".to_string();
    let client = OpenAiClient::from_config(&config, Some("key")).unwrap();
    assert_eq!(client.endpoint().as_str(), "http://localhost:11434/v1/chat/completions");
    assert_eq!(client.model(), config.llm.model);
  }

  #[test]
  fn test_request_body_shape() {
    let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hello")];
    let request =
      CompletionRequest { model: "m", messages: &messages, temperature: 0.5, max_tokens: 10 };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["model"], "m");
    assert_eq!(value["max_tokens"], 10);
    assert_eq!(value["messages"][0]["role"], "system");
    assert_eq!(value["messages"][1]["content"], "hello");
  }

  #[test]
  fn test_answer_is_first_choice() {
    let body = serde_json::json!({
      "id": "x",
      "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Restock Dallas." } }]
    });
    let response: CompletionResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.into_answer().unwrap(), "Restock Dallas.");
  }

  #[test]
  fn test_empty_answers_are_errors() {
    for body in [
      r#"{"choices":[]}"#,
      r#"{}"#,
      r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
      r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#,
    ] {
      let response: CompletionResponse = serde_json::from_str(body).unwrap();
      assert!(matches!(response.into_answer(), Err(AssistantError::EmptyResponse)), "{body}");
    }
  }
}
