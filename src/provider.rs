//! The seam between the relay endpoint and the text-generation service.
//!
//! A provider opens one chat session per request. The session owns its
//! history and grows it as messages are exchanged; it is dropped when the
//! request finishes.

use crate::models::{ConversationTurn, Part};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to provider timed out")]
    Timeout,

    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    #[error("Provider returned no text (finish reason: {0})")]
    EmptyResponse(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key, so it must never reach the message
        let err = err.without_url();
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

pub trait GenerationProvider: Send + Sync {
    /// Opens a session seeded with prior turns.
    fn start_chat(
        &self,
        history: Vec<ConversationTurn>,
    ) -> Result<Box<dyn ChatSession>, ProviderError>;
}

#[async_trait]
pub trait ChatSession: Send {
    /// Sends a user message and returns the generated reply text.
    async fn send_message(&mut self, parts: Vec<Part>) -> Result<String, ProviderError>;

    fn history(&self) -> &[ConversationTurn];
}
