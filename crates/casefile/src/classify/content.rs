use std::sync::Arc;

use log::debug;

use crate::config::PromptPack;
use crate::llm::{ChatService, LlmError};

/// Phrase whose presence in the reply marks a new-report email.
pub const NEW_REPORT_PHRASE: &str = "new rs3 report";

/// Decides from subject and body whether a folder needs a fresh report.
///
/// `Ok(false)` is an explicit "other" answer. Missing credentials and
/// service failures come back as `Err` so callers can keep them apart.
pub struct ContentClassifier {
    chat: Arc<dyn ChatService>,
    prompts: PromptPack,
}

impl ContentClassifier {
    pub fn new(chat: Arc<dyn ChatService>, prompts: &PromptPack) -> Self {
        Self {
            chat,
            prompts: prompts.clone(),
        }
    }

    pub async fn classify(&self, combined_text: &str) -> Result<bool, LlmError> {
        let message = self.prompts.classifier_message(combined_text);
        let reply = self
            .chat
            .complete(&self.prompts.classifier_instructions, &message)
            .await?;
        debug!("Classifier reply: {}", reply.trim());
        Ok(is_new_report(&reply))
    }
}

pub fn is_new_report(reply: &str) -> bool {
    reply.to_lowercase().contains(NEW_REPORT_PHRASE)
}
