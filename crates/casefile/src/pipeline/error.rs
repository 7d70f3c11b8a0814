use thiserror::Error;

use crate::error::StoreError;

/// Failures that end a run. Everything else is recorded per folder.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Folder discovery failed: {0}")]
    Discovery(#[source] StoreError),
}

/// Non-fatal problems in the stages after generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    PersistFailed { folder: String, error: String },
    NotifyFailed { folder: String, error: String },
    ArchiveFailed { folder: String, error: String },
}
