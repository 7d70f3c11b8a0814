use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info};

use crate::combine::pdf::render_text_pdf;
use crate::config::PromptPack;
use crate::llm::ChatService;
use crate::record::CaseRecord;
use crate::report::amendment::{extract_case_number, SolicitationType, UNKNOWN_CASE};
use crate::report::message::ExchangeMessage;
use crate::report::{BidRecommendation, ReportError};
use crate::staging::LocalStaging;

#[derive(Debug)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub case_number: String,
    pub recommendation: BidRecommendation,
    /// Markdown-ish text the PDF was rendered from.
    pub text: String,
}

/// Runs the analysis exchanges over a combined solicitation document and
/// writes the resulting report as `{case}-report.pdf`.
pub struct ReportGenerator {
    chat: Arc<dyn ChatService>,
    prompts: PromptPack,
    staging: LocalStaging,
}

impl ReportGenerator {
    pub fn new(chat: Arc<dyn ChatService>, prompts: &PromptPack, staging: LocalStaging) -> Self {
        Self {
            chat,
            prompts: prompts.clone(),
            staging,
        }
    }

    async fn ask(&self, instructions: &str, message: ExchangeMessage<'_>) -> Result<String, ReportError> {
        let reply = self.chat.complete(instructions, &message.render()).await?;
        Ok(reply.trim().to_string())
    }

    pub async fn generate(
        &self,
        document_text: &str,
        record: &CaseRecord,
    ) -> Result<GeneratedReport, ReportError> {
        let p = &self.prompts;
        let org = &p.organization;

        let case_reply = self
            .ask(
                &p.case_number,
                ExchangeMessage::new("What is the RS3 number?").document(document_text),
            )
            .await?;
        let case_number = resolve_case_number(record, &case_reply);
        debug!("Case number resolved to '{}'", case_number);

        let requirements = self
            .ask(
                &p.extract_requirements,
                ExchangeMessage::new("What are the requirements in the RS3?").document(document_text),
            )
            .await?;

        let title = self
            .ask(
                &p.title_summary,
                ExchangeMessage::new(
                    "What is the title, task order summary, and NAICS code from the document?",
                )
                .document(document_text),
            )
            .await?;

        let fit_question = format!(
            "Analyze the fit of the document with the capability statement and the core capabilities of {}.",
            org
        );
        let fit = self
            .ask(
                &p.fit_analysis,
                ExchangeMessage::new(&fit_question)
                    .document(document_text)
                    .context(p, &["capability_statement", "core_capabilities"]),
            )
            .await?;

        let match_question = format!(
            "Look for a match for each requirement/ task with the capabilities of {}.",
            org
        );
        let matches = self
            .ask(
                &p.capability_match,
                ExchangeMessage::new(&match_question)
                    .document(document_text)
                    .context(p, &["core_capabilities", "company_profile"])
                    .requirements(&requirements),
            )
            .await?;

        let keywords = self
            .ask(
                &p.keyword_match,
                ExchangeMessage::new(
                    "Identify matches in the RS3 document with the keywords, locations, and account plans. \
                     Do not make note of a keyword/ location/ account plan UNLESS IT IS EXPLICITLY MENTIONED IN THE RS3 DOCUMENT.",
                )
                .document(document_text)
                .context(p, &["keywords", "locations", "account_plans"]),
            )
            .await?;

        let scope = self
            .ask(
                &p.scope_analysis,
                ExchangeMessage::new(
                    "Analyze the scope of work of the document to see if the tasks match the work scope summary.",
                )
                .document(document_text)
                .requirements(&requirements),
            )
            .await?;

        let past_question = format!(
            "Compare the past performance of {} with the past performance references you know of and name the source of each match.",
            org
        );
        let past_performance = self
            .ask(
                &p.past_performance,
                ExchangeMessage::new(&past_question)
                    .document(document_text)
                    .context(p, &["past_performance"]),
            )
            .await?;

        let solicitation_type = SolicitationType::detect(&record.combined_text());
        let body = format!(
            "# {} - {}\n{}\n{}\n{}\n{}\n{}\n{}",
            display_case(&case_number),
            solicitation_type,
            title,
            fit,
            matches,
            keywords,
            scope,
            past_performance
        );

        let bid_question = format!("Analyze whether or not {} should bid this RS3 opportunity.", org);
        let bid_analysis = self
            .ask(
                &p.bid_analysis,
                ExchangeMessage::new(&bid_question)
                    .document(document_text)
                    .report(&body),
            )
            .await?;
        let recommendation = BidRecommendation::from_analysis(&bid_analysis);

        let text = format!("# AI Recommendation: {}\n{}", recommendation, body);
        let pdf = render_text_pdf(&text)?;
        let stem = format!("{}-report", display_case(&case_number));
        let path = self.staging.store(&pdf, "", &stem, "pdf")?;

        info!(
            "Report for {} saved as {:?} (recommendation: {})",
            display_case(&case_number),
            path.file_name().unwrap_or_default(),
            recommendation
        );

        Ok(GeneratedReport {
            path,
            case_number,
            recommendation,
            text,
        })
    }
}

/// Case number from the record subject, else from the model's answer.
fn resolve_case_number(record: &CaseRecord, reply: &str) -> String {
    let from_subject = extract_case_number(&record.subject);
    if from_subject.is_empty() {
        extract_case_number(reply)
    } else {
        from_subject
    }
}

fn display_case(case_number: &str) -> &str {
    if case_number.is_empty() {
        UNKNOWN_CASE
    } else {
        case_number
    }
}
