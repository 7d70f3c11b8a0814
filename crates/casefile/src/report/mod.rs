//! The two processing branches: full analysis reports for new solicitations
//! and short summaries for follow-up emails.

pub mod amendment;
pub mod generator;
pub mod message;

use std::fmt;

use thiserror::Error;

use crate::error::{ProcessError, StagingError};
use crate::llm::LlmError;

pub use amendment::{AmendmentGenerator, EventType, GeneratedAmendment, SolicitationType};
pub use generator::{GeneratedReport, ReportGenerator};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Chat exchange failed: {0}")]
    Chat(#[from] LlmError),

    #[error("Rendering failed: {0}")]
    Render(#[from] ProcessError),

    #[error("Saving failed: {0}")]
    Staging(#[from] StagingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRecommendation {
    Bid,
    NoBid,
    Unknown,
}

impl BidRecommendation {
    pub fn from_analysis(analysis: &str) -> Self {
        if analysis.contains("OVERALL_RECOMMENDATION=NO_BID") {
            BidRecommendation::NoBid
        } else if analysis.contains("OVERALL_RECOMMENDATION=BID") {
            BidRecommendation::Bid
        } else {
            BidRecommendation::Unknown
        }
    }
}

impl fmt::Display for BidRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BidRecommendation::Bid => "Bid",
            BidRecommendation::NoBid => "No Bid",
            BidRecommendation::Unknown => "Unknown",
        })
    }
}
