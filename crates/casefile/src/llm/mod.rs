//! Chat-completion access used for classification and narrative generation.

pub mod openai;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiChatClient;
pub use retry::RetryingChat;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("No API credential configured")]
    MissingCredential,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Whether a repeated call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Request(_) | LlmError::Timeout => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
            LlmError::MissingCredential | LlmError::MalformedResponse(_) => false,
        }
    }
}

/// One instruction/message exchange with a chat model.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, instructions: &str, message: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: ChatService + ?Sized> ChatService for std::sync::Arc<T> {
    async fn complete(&self, instructions: &str, message: &str) -> Result<String, LlmError> {
        (**self).complete(instructions, message).await
    }
}
