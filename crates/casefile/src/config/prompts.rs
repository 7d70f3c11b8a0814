use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Instructions for every chat exchange the pipeline makes.
///
/// Loaded from YAML; any entry left out keeps its built-in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptPack {
    /// Name used for "our" side in analysis questions.
    pub organization: String,
    pub classifier_instructions: String,
    /// Must contain `{content}`.
    pub classifier_template: String,
    pub case_number: String,
    pub extract_requirements: String,
    pub title_summary: String,
    pub fit_analysis: String,
    pub capability_match: String,
    pub keyword_match: String,
    pub scope_analysis: String,
    pub past_performance: String,
    pub bid_analysis: String,
    pub amendment_summary: String,
    /// Named reference texts (capability statement, keyword lists, ...).
    pub context: BTreeMap<String, String>,
}

impl Default for PromptPack {
    fn default() -> Self {
        Self {
            organization: "our company".to_string(),
            classifier_instructions: DEFAULT_CLASSIFIER_INSTRUCTIONS.to_string(),
            classifier_template: "Classify the following email as either a 'new RS3 report' or 'other':\n\n{content}\n\nClassification:".to_string(),
            case_number: "Find the solicitation number in the document. It has the form RS3-YY-NNNN or RS2-YY-NNNN. Output only the number.".to_string(),
            extract_requirements: "List every requirement and task stated in the document as a numbered list. Quote task identifiers where present.".to_string(),
            title_summary: "Output a markdown section with the opportunity title, a short task order summary and the NAICS code.".to_string(),
            fit_analysis: "Assess how well the opportunity fits the capability statement and the core capabilities. Output a markdown section with a short rating and the reasoning.".to_string(),
            capability_match: "For each requirement, name the matching capability or state that there is no match. Output a markdown table.".to_string(),
            keyword_match: "List keywords, locations and account plans from the reference lists that the document explicitly mentions. Never list an item that the document does not mention.".to_string(),
            scope_analysis: "Compare the scope of work with the requirements and summarize the work scope in a markdown section.".to_string(),
            past_performance: "Identify past performance that is relevant to this opportunity and name the source for each reference.".to_string(),
            bid_analysis: "Decide whether the opportunity should be bid. End your answer with exactly one line: OVERALL_RECOMMENDATION=BID or OVERALL_RECOMMENDATION=NO_BID.".to_string(),
            amendment_summary: "Summarize the email. State whether it announces an amendment, an industry day, or something else, and list any dates and actions it requires.".to_string(),
            context: BTreeMap::new(),
        }
    }
}

const DEFAULT_CLASSIFIER_INSTRUCTIONS: &str = "\
# IDENTITY and PURPOSE

You classify emails into two classes: 'new RS3 report' or 'other'. A new RS3 report \
is the original message announcing a new solicitation (RFI, DRFP or RFP). Follow-ups, \
replies, amendments, industry days and question & answer emails are 'other'.

# STEPS

1. Read the first message of the thread.
2. Decide whether it is the original announcement of a new solicitation.
3. Classify the email.

# OUTPUT INSTRUCTIONS

- Output only the classification: either \"new RS3 report\" or \"other\".
- Do not include any additional text.";

impl PromptPack {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let pack: PromptPack = serde_yaml::from_str(content)?;
        pack.validate()?;
        Ok(pack)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.classifier_template.contains("{content}") {
            return Err(ConfigError::Validation {
                message: "classifier_template must contain '{content}'".to_string(),
            });
        }
        Ok(())
    }

    pub fn classifier_message(&self, content: &str) -> String {
        self.classifier_template.replace("{content}", content)
    }

    /// Reference text by name; absent entries read as empty.
    pub fn context_text(&self, name: &str) -> Option<&str> {
        self.context
            .get(name)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}
