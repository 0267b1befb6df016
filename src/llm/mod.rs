//! LLM client module: the agent's model gateway.
//!
//! The gateway takes a conversation and hands back the complete generated
//! text, or `None` when the provider could not be reached or answered with an
//! error. Callers never see transport errors and never depend on the fact that
//! the default client streams.

mod error;
mod openai_compat;

pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use openai_compat::{OpenAiCompatClient, StreamObserver};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a simple text message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Optional parameters for chat completions.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling temperature (0 = deterministic).
    pub temperature: Option<f64>,
}

/// Trait for LLM clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a reply for `messages`.
    ///
    /// Returns `None` on any provider or transport failure.
    async fn think(&self, messages: &[ChatMessage], options: &ChatOptions) -> Option<String>;
}
