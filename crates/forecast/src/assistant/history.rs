//! Chat messages and the bounded conversation history
//!
//! The history only ever holds whole question/answer exchanges, so it never
//! opens with an orphaned assistant reply.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
  Assistant,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Role::System => "system",
      Role::User => "user",
      Role::Assistant => "assistant",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: Role::System, content: content.into() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self { role: Role::User, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: Role::Assistant, content: content.into() }
  }
}

/// Recent exchanges, oldest first, never longer than `window` messages.
/// With an odd window the oldest exchange goes as a whole, so at most
/// `window - 1` messages are kept.
///
/// Owned by the caller and lent to each assistant call, so one assistant
/// can serve any number of independent conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
  messages: VecDeque<ChatMessage>,
  window: usize,
}

impl ConversationHistory {
  pub fn new(window: usize) -> Self {
    Self { messages: VecDeque::with_capacity(window), window }
  }

  pub fn window(&self) -> usize {
    self.window
  }

  pub fn len(&self) -> usize {
    self.messages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
    self.messages.iter()
  }

  /// Append a completed question/answer pair, dropping the oldest
  /// exchanges past the window
  pub fn record_exchange(&mut self, question: &str, answer: &str) {
    self.messages.push_back(ChatMessage::user(question));
    self.messages.push_back(ChatMessage::assistant(answer));

    while self.messages.len() > self.window
      || self.messages.front().is_some_and(|m| m.role != Role::User)
    {
      self.messages.pop_front();
    }
  }

  pub fn clear(&mut self) {
    self.messages.clear();
  }
}
