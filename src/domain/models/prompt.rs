use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A fully buffered block of user text.
///
/// Only the literal empty string is rejected: a prompt consisting of
/// whitespace is still what the user typed and is forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.is_empty() {
            return Err(DomainError::input_missing("Error: No prompt provided."));
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

}

/// Author of a chat message. The relay only ever speaks as the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// One message of a chat conversation, serialized in the wire shape
/// chat-completion APIs expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// What a completed relay printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub fragments: usize,
    pub characters: usize,
}
