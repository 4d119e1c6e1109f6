//! UI-agnostic conversation types
//!
//! The conversation is append-only: messages are never edited or removed, and
//! insertion order is display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shortcuts::GREETING;

/// A chat message in the lounge conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// A new conversation holding only the assistant greeting.
    pub fn new() -> Self {
        let mut conversation = Self { messages: Vec::new() };
        conversation.push(ChatRole::Assistant, GREETING.to_string());
        conversation
    }

    pub fn append_user_message(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatRole::User, content.into())
    }

    pub fn append_assistant_message(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatRole::Assistant, content.into())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    fn push(&mut self, role: ChatRole, content: String) -> &ChatMessage {
        // Never let a wall-clock step backwards reorder the transcript.
        let now = Utc::now();
        let timestamp = match self.messages.last() {
            Some(prev) if prev.timestamp > now => prev.timestamp,
            _ => now,
        };

        self.messages.push(ChatMessage {
            role,
            content,
            timestamp,
        });
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
