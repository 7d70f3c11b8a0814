use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use log::{debug, info};
use regex::Regex;

use crate::combine::pdf::render_text_pdf;
use crate::config::PromptPack;
use crate::llm::ChatService;
use crate::record::CaseRecord;
use crate::report::message::ExchangeMessage;
use crate::report::ReportError;
use crate::staging::LocalStaging;

static RE_CASE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RS[23]-\d{2}-\d{4}").unwrap());

const SUMMARY_QUESTION: &str = "Summarize the email that has the amendment or industry day.";

/// Stem used in file names when no case number could be found.
pub const UNKNOWN_CASE: &str = "UNKNOWN";

/// First case number (`RS3-24-0001` style) in `text`, or empty.
pub fn extract_case_number(text: &str) -> String {
    RE_CASE_NUMBER
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolicitationType {
    Rfi,
    Drfp,
    Rfp,
    Sow,
    Pws,
    Unknown,
}

impl SolicitationType {
    /// Classifies by keyword, checked in this order: RFI, DRFP, RFP, SOW, PWS.
    pub fn detect(text: &str) -> Self {
        let upper = text.to_uppercase();
        let has = |needles: &[&str]| needles.iter().any(|n| upper.contains(n));

        if has(&["RFI", "REQUEST FOR INFORMATION"]) {
            SolicitationType::Rfi
        } else if has(&[
            "DRFP",
            "DRAFT RFP",
            "DRAFT REQUEST FOR PROPOSAL",
            "DRAFT SOLICITATION",
        ]) {
            SolicitationType::Drfp
        } else if has(&["RFP", "REQUEST FOR PROPOSAL"]) {
            SolicitationType::Rfp
        } else if has(&["SOW", "STATEMENT OF WORK"]) {
            SolicitationType::Sow
        } else if has(&["PWS", "PERFORMANCE WORK STATEMENT"]) {
            SolicitationType::Pws
        } else {
            SolicitationType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolicitationType::Rfi => "RFI",
            SolicitationType::Drfp => "DRFP",
            SolicitationType::Rfp => "RFP",
            SolicitationType::Sow => "SOW",
            SolicitationType::Pws => "PWS",
            SolicitationType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SolicitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Amendment,
    IndustryDay,
    Other,
}

impl EventType {
    /// "amendment" wins over "industry day" when the analysis mentions both.
    pub fn from_analysis(analysis: &str) -> Self {
        let lower = analysis.to_lowercase();
        if lower.contains("amendment") {
            EventType::Amendment
        } else if lower.contains("industry day") {
            EventType::IndustryDay
        } else {
            EventType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Amendment => "amendment",
            EventType::IndustryDay => "industry_day",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File stem for an amendment report: `{case}_{event}-report`.
pub fn amendment_stem(case_number: &str, event: EventType) -> String {
    let case = if case_number.is_empty() {
        UNKNOWN_CASE
    } else {
        case_number
    };
    format!("{}_{}-report", case, event)
}

#[derive(Debug)]
pub struct GeneratedAmendment {
    pub path: PathBuf,
    pub case_number: String,
    pub solicitation_type: SolicitationType,
    pub event: EventType,
}

/// Summarizes follow-up emails (amendments, industry days, ...) into a PDF.
pub struct AmendmentGenerator {
    chat: Arc<dyn ChatService>,
    prompts: PromptPack,
    staging: LocalStaging,
}

impl AmendmentGenerator {
    pub fn new(chat: Arc<dyn ChatService>, prompts: &PromptPack, staging: LocalStaging) -> Self {
        Self {
            chat,
            prompts: prompts.clone(),
            staging,
        }
    }

    pub async fn generate(&self, record: &CaseRecord) -> Result<GeneratedAmendment, ReportError> {
        let case_number = extract_case_number(&record.subject);
        let email = record.combined_text();
        let solicitation_type = SolicitationType::detect(&email);
        debug!("Case number: '{}', type: {}", case_number, solicitation_type);

        let message = ExchangeMessage::new(SUMMARY_QUESTION)
            .email_info(&email)
            .render();
        let analysis = self
            .chat
            .complete(&self.prompts.amendment_summary, &message)
            .await?;

        let event = EventType::from_analysis(&analysis);
        let pdf = render_text_pdf(&analysis)?;
        let path = self
            .staging
            .store(&pdf, "", &amendment_stem(&case_number, event), "pdf")?;

        info!(
            "Amendment report for {} ({}) saved as {:?}",
            if case_number.is_empty() { UNKNOWN_CASE } else { case_number.as_str() },
            event,
            path.file_name().unwrap_or_default()
        );

        Ok(GeneratedAmendment {
            path,
            case_number,
            solicitation_type,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Echo {
        reply: String,
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatService for Echo {
        async fn complete(&self, _instructions: &str, message: &str) -> Result<String, LlmError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_extract_case_number() {
        assert_eq!(extract_case_number("New RS3: RS2-24-0099 RFP"), "RS2-24-0099");
        assert_eq!(extract_case_number("Re: RS3-23-1234 amendment 2"), "RS3-23-1234");
        assert_eq!(extract_case_number("RS4-24-0099"), "");
        assert_eq!(extract_case_number("no number"), "");
    }

    #[test]
    fn test_solicitation_type_order() {
        let cases = [
            ("Request for Information on logistics", SolicitationType::Rfi),
            ("draft solicitation released", SolicitationType::Drfp),
            ("Draft RFP posted", SolicitationType::Drfp),
            ("RFP RS3-24-0001", SolicitationType::Rfp),
            ("statement of work attached", SolicitationType::Sow),
            ("PWS attached", SolicitationType::Pws),
            ("hello", SolicitationType::Unknown),
        ];

        for (text, expected) in cases {
            assert_eq!(SolicitationType::detect(text), expected, "text: {}", text);
        }
    }

    #[test]
    fn test_event_type_from_analysis() {
        assert_eq!(EventType::from_analysis("Amendment 3 extends the deadline"), EventType::Amendment);
        assert_eq!(EventType::from_analysis("An Industry Day is scheduled"), EventType::IndustryDay);
        assert_eq!(
            EventType::from_analysis("industry day and amendment"),
            EventType::Amendment
        );
        assert_eq!(EventType::from_analysis("Questions were answered"), EventType::Other);
    }

    #[test]
    fn test_amendment_stem() {
        assert_eq!(amendment_stem("RS3-24-0001", EventType::Other), "RS3-24-0001_other-report");
        assert_eq!(amendment_stem("", EventType::IndustryDay), "UNKNOWN_industry_day-report");
    }

    #[tokio::test]
    async fn test_generate_writes_named_pdf() {
        let temp = TempDir::new().unwrap();
        let chat = Arc::new(Echo {
            reply: "The government announced an industry day on 5 May.".to_string(),
            messages: Mutex::new(Vec::new()),
        });
        let generator = AmendmentGenerator::new(
            chat.clone(),
            &PromptPack::default(),
            LocalStaging::new(temp.path()),
        );

        let record = CaseRecord::new("RS3-24-0042 industry day", "Join us.");
        let generated = generator.generate(&record).await.unwrap();

        assert_eq!(generated.case_number, "RS3-24-0042");
        assert_eq!(generated.event, EventType::IndustryDay);
        assert_eq!(
            generated.path.file_name().unwrap(),
            "RS3-24-0042_industry_day-report.pdf"
        );
        assert!(std::fs::read(&generated.path).unwrap().starts_with(b"%PDF"));

        let messages = chat.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with(SUMMARY_QUESTION));
        assert!(messages[0].ends_with("Email Info:\nSubject: RS3-24-0042 industry day\n\nBody:\nJoin us."));
    }
}
