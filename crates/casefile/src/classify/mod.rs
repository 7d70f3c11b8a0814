//! Folder routing: content classification of the case record and filename
//! classification of the documents in report folders.

pub mod content;
pub mod filename;

pub use content::{ContentClassifier, NEW_REPORT_PHRASE};
pub use filename::{FileVerdict, FilenameClassifier, FilenameRule, VerdictReason};
