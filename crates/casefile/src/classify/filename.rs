//! Filename heuristics deciding whether a document is a target document.
//!
//! Pure and total: the first rule whose patterns match decides, and every
//! name falls through to the default verdict if nothing matches.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictReason {
    NegativePattern,
    StrongIndicator,
    WeakIndicator,
    FoprWithoutStrongIndicator,
    NoMatch,
}

impl fmt::Display for VerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            VerdictReason::NegativePattern => "File name contains negative patterns",
            VerdictReason::StrongIndicator => "File name contains strong RS3 indicator",
            VerdictReason::WeakIndicator => {
                "File name contains weak RS3 indicator and is not an attachment or fopr"
            }
            VerdictReason::FoprWithoutStrongIndicator => {
                "File contains 'fopr' without strong RS3 indicator"
            }
            VerdictReason::NoMatch => {
                "File name does not match RS3 patterns or is an attachment/fopr without strong indicators"
            }
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileVerdict {
    pub is_target: bool,
    pub reason: VerdictReason,
}

impl FileVerdict {
    pub const fn target(reason: VerdictReason) -> Self {
        Self {
            is_target: true,
            reason,
        }
    }

    pub const fn rejected(reason: VerdictReason) -> Self {
        Self {
            is_target: false,
            reason,
        }
    }
}

/// One row of the rule table: fires when any `any_of` pattern and none of
/// the `none_of` patterns occur in the name (case-insensitive).
#[derive(Debug, Clone, Copy)]
pub struct FilenameRule {
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
    pub verdict: FileVerdict,
}

pub const NEGATIVE_PATTERNS: &[&str] = &[
    "amendment",
    "questions",
    "answers",
    "Q&A",
    "Q & A",
    "industry",
    "amend",
    "CDRL",
    "rev",
    "revision",
    "cover letter",
    "labor",
    "v2",
];

pub const STRONG_PATTERNS: &[&str] = &[
    "RFI",
    "Request for Information",
    "DRFP",
    "Draft RFP",
    "Draft Request for Proposal",
    "RFP",
    "Request for Proposal",
    "PWS",
    "Performance Work Statement",
    "SOW",
    "Statement of Work",
];

pub const WEAK_PATTERNS: &[&str] = &["RS3", "Responsive Strategic Sourcing for Services"];

pub const DEFAULT_RULES: &[FilenameRule] = &[
    FilenameRule {
        any_of: NEGATIVE_PATTERNS,
        none_of: &[],
        verdict: FileVerdict::rejected(VerdictReason::NegativePattern),
    },
    FilenameRule {
        any_of: STRONG_PATTERNS,
        none_of: &[],
        verdict: FileVerdict::target(VerdictReason::StrongIndicator),
    },
    FilenameRule {
        any_of: WEAK_PATTERNS,
        none_of: &["attachment", "fopr"],
        verdict: FileVerdict::target(VerdictReason::WeakIndicator),
    },
    // Reached only when no strong pattern matched.
    FilenameRule {
        any_of: &["fopr"],
        none_of: &[],
        verdict: FileVerdict::rejected(VerdictReason::FoprWithoutStrongIndicator),
    },
];

pub const DEFAULT_VERDICT: FileVerdict = FileVerdict::rejected(VerdictReason::NoMatch);

/// Extensions the classifier accepts; everything else is skipped upstream.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "docx"];

pub struct FilenameClassifier {
    rules: &'static [FilenameRule],
}

impl FilenameClassifier {
    pub fn new() -> Self {
        Self::with_rules(DEFAULT_RULES)
    }

    pub fn with_rules(rules: &'static [FilenameRule]) -> Self {
        Self { rules }
    }

    pub fn classify(&self, name: &str) -> FileVerdict {
        let lowered = name.to_lowercase();
        let contains = |pattern: &&str| lowered.contains(&pattern.to_lowercase());

        self.rules
            .iter()
            .find(|rule| rule.any_of.iter().any(contains) && !rule.none_of.iter().any(contains))
            .map(|rule| rule.verdict)
            .unwrap_or(DEFAULT_VERDICT)
    }
}

impl Default for FilenameClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// True for names the classifier is meant to see.
pub fn is_supported(name: &str) -> bool {
    crate::store::extension(name)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}
