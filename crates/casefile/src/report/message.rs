use crate::config::PromptPack;

/// User message of one chat exchange.
///
/// Sections are appended in a fixed order: question, document text (unless
/// the exchange is about an email), named reference texts, requirements,
/// the assembled report, and finally the email itself.
#[derive(Debug, Default)]
pub struct ExchangeMessage<'a> {
    question: &'a str,
    document: Option<&'a str>,
    context: Vec<(&'a str, &'a str)>,
    requirements: Option<&'a str>,
    report: Option<&'a str>,
    email_info: Option<&'a str>,
}

impl<'a> ExchangeMessage<'a> {
    pub fn new(question: &'a str) -> Self {
        Self {
            question,
            ..Default::default()
        }
    }

    pub fn document(mut self, text: &'a str) -> Self {
        self.document = Some(text);
        self
    }

    /// Adds every named reference text the prompt pack has; missing ones are skipped.
    pub fn context(mut self, prompts: &'a PromptPack, names: &[&'a str]) -> Self {
        for name in names {
            if let Some(text) = prompts.context_text(name) {
                self.context.push((name, text));
            }
        }
        self
    }

    pub fn requirements(mut self, text: &'a str) -> Self {
        self.requirements = Some(text);
        self
    }

    pub fn report(mut self, text: &'a str) -> Self {
        self.report = Some(text);
        self
    }

    pub fn email_info(mut self, text: &'a str) -> Self {
        self.email_info = Some(text);
        self
    }

    pub fn render(&self) -> String {
        let mut message = self.question.to_string();

        if self.email_info.is_none() {
            if let Some(document) = self.document {
                message.push_str("\n\nRS3 Document Content:\n");
                message.push_str(document);
            }
        }
        for (name, text) in &self.context {
            message.push_str(&format!("\n\nAdditional Content from {}:\n{}", name, text));
        }
        if let Some(requirements) = self.requirements.filter(|r| !r.is_empty()) {
            message.push_str("\n\nRequirements:\n");
            message.push_str(requirements);
        }
        if let Some(report) = self.report.filter(|r| !r.is_empty()) {
            message.push_str("\n\n\nFull RS3 Analysis Report:\n");
            message.push_str(report);
        }
        if let Some(email_info) = self.email_info {
            message.push_str("\n\nEmail Info:\n");
            message.push_str(email_info);
        }

        message
    }
}
