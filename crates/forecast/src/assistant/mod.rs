//! LLM assistant
//!
//! Answers a question from a system prompt, the caller's conversation
//! history and an optional data context. The backend is a trait so the
//! message assembly can be tested without a network.

pub mod client;
pub mod history;

use async_trait::async_trait;

pub use client::OpenAiClient;
pub use history::{ChatMessage, ConversationHistory, Role};

use crate::config::PromptConfig;
use crate::error::AssistantError;
use crate::summarize::ContextPayload;

pub type AssistantResult<T> = std::result::Result<T, AssistantError>;

/// A chat completion service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
  async fn complete(&self, messages: &[ChatMessage]) -> AssistantResult<String>;
}

pub struct Assistant<B: ChatBackend> {
  backend: B,
  prompts: PromptConfig,
}

impl<B: ChatBackend> Assistant<B> {
  pub fn new(backend: B, prompts: PromptConfig) -> Self {
    Self { backend, prompts }
  }

  /// Messages for one request: system prompt, history, data context, question
  pub fn messages(
    &self,
    history: &ConversationHistory,
    query: &str,
    context: Option<&ContextPayload>,
  ) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ChatMessage::system(self.prompts.system.clone()));
    messages.extend(history.iter().cloned());

    if let Some(payload) = context.filter(|p| !p.is_empty()) {
      messages.push(ChatMessage::system(self.prompts.context_message(&payload.render())));
    }

    messages.push(ChatMessage::user(query));
    messages
  }

  /// Ask one question. The exchange is recorded in `history` only when the
  /// backend answers; a failed call leaves the history as it was.
  pub async fn ask(
    &self,
    history: &mut ConversationHistory,
    query: &str,
    context: Option<&ContextPayload>,
  ) -> AssistantResult<String> {
    let messages = self.messages(history, query, context);
    let answer = self.backend.complete(&messages).await?;
    history.record_exchange(query, &answer);
    Ok(answer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::MonthlyRecord;
  use crate::planner::DataSlice;
  use crate::summarize::summarize;

  fn prompts() -> PromptConfig {
    PromptConfig { system: "SYSTEM".to_string(), context_template: "DATA:{context}".to_string() }
  }

  fn payload(count: usize) -> ContextPayload {
    let rows = (0..count)
      .map(|i| MonthlyRecord::new("P", "Dallas (TX)", "2020-03".parse().unwrap(), i as u64))
      .collect();
    summarize(&DataSlice::Monthly(rows), 50)
  }

  #[test]
  fn test_message_order_with_context() {
    let assistant = Assistant::new(MockChatBackend::new(), prompts());
    let mut history = ConversationHistory::new(10);
    history.record_exchange("earlier", "answer");

    let messages = assistant.messages(&history, "now?", Some(&payload(2)));
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::System, Role::User]);
    assert_eq!(messages[0].content, "SYSTEM");
    assert!(messages[3].content.starts_with("DATA:Complete data (2 rows):"));
    assert_eq!(messages[4].content, "now?");
  }

  #[test]
  fn test_empty_context_is_skipped() {
    let assistant = Assistant::new(MockChatBackend::new(), prompts());
    let history = ConversationHistory::new(10);
    assert_eq!(assistant.messages(&history, "q", Some(&payload(0))).len(), 2);
    assert_eq!(assistant.messages(&history, "q", None).len(), 2);
  }

  #[test]
  fn test_success_records_exchange() {
    let mut backend = MockChatBackend::new();
    backend
      .expect_complete()
      .withf(|messages| messages.len() == 3)
      .times(1)
      .returning(|_| Ok("Dallas leads.".to_string()));

    let assistant = Assistant::new(backend, prompts());
    let mut history = ConversationHistory::new(10);
    let answer =
      tokio_test::block_on(assistant.ask(&mut history, "Who leads?", Some(&payload(1)))).unwrap();

    assert_eq!(answer, "Dallas leads.");
    let recorded: Vec<ChatMessage> = history.iter().cloned().collect();
    assert_eq!(
      recorded,
      vec![ChatMessage::user("Who leads?"), ChatMessage::assistant("Dallas leads.")]
    );
  }

  #[test]
  fn test_failure_leaves_history_unchanged() {
    let mut backend = MockChatBackend::new();
    backend
      .expect_complete()
      .times(1)
      .returning(|_| Err(AssistantError::Http { status: 429, body: "slow down".to_string() }));

    let assistant = Assistant::new(backend, prompts());
    let mut history = ConversationHistory::new(10);
    history.record_exchange("before", "kept");
    let snapshot = history.clone();

    let result = tokio_test::block_on(assistant.ask(&mut history, "q", None));
    assert!(matches!(result, Err(AssistantError::Http { status: 429, .. })));
    assert_eq!(history, snapshot);
  }

  #[test]
  fn test_history_window_applies_across_asks() {
    let mut backend = MockChatBackend::new();
    backend.expect_complete().times(3).returning(|_| Ok("ok".to_string()));

    let assistant = Assistant::new(backend, prompts());
    let mut history = ConversationHistory::new(4);
    for question in ["a", "b", "c"] {
      tokio_test::block_on(assistant.ask(&mut history, question, None)).unwrap();
    }

    assert_eq!(history.len(), 4);
    assert_eq!(history.iter().next().map(|m| m.content.as_str()), Some("b"));
  }
}
