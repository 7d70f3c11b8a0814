use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use super::{ChatService, LlmError};

/// Repeats transient failures of an inner service with linear backoff.
///
/// With `max_attempts == 1` this is a pass-through.
pub struct RetryingChat<S> {
    inner: S,
    max_attempts: u32,
    backoff: Duration,
}

impl<S: ChatService> RetryingChat<S> {
    pub fn new(inner: S, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

#[async_trait]
impl<S: ChatService> ChatService for RetryingChat<S> {
    async fn complete(&self, instructions: &str, message: &str) -> Result<String, LlmError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(instructions, message).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        "Chat call failed (attempt {}/{}): {}",
                        attempt, self.max_attempts, e
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
