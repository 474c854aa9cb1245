//! Message and conversation domain types.
//!
//! These are the value objects that flow through one call:
//! caller history → reconstructed turns → assembled sequence → provider.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Persona instructions and retrieved context
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One completed user/assistant exchange from the caller's history.
///
/// Serialized as a two-element array `["user text", "assistant text"]`,
/// the shape chat front-ends usually keep their history in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

impl From<(String, String)> for Exchange {
    fn from((user, assistant): (String, String)) -> Self {
        Self { user, assistant }
    }
}

impl From<(&str, &str)> for Exchange {
    fn from((user, assistant): (&str, &str)) -> Self {
        Self::new(user, assistant)
    }
}

impl From<Exchange> for (String, String) {
    fn from(exchange: Exchange) -> Self {
        (exchange.user, exchange.assistant)
    }
}

/// The ordered messages handed to the response generator for one call.
///
/// Can only be built from a preamble plus the current query, so the final
/// element is always the user's query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSequence {
    messages: Vec<Message>,
}

impl MessageSequence {
    /// Append the current query as a user message after `preamble`.
    pub fn new(mut preamble: Vec<Message>, query: impl Into<String>) -> Self {
        preamble.push(Message::user(query));
        Self { messages: preamble }
    }

    /// All messages, in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Everything before the final query.
    pub fn preamble(&self) -> &[Message] {
        &self.messages[..self.messages.len() - 1]
    }

    /// The final user message.
    pub fn query(&self) -> &Message {
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Consume the sequence.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
