use std::fmt;

use tracing::info;

use super::summary::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Discover,
    ClassifyContent,
    ClassifyFiles,
    Prepare,
    Generate,
    Persist,
    Notify,
    Archive,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::Discover => "Discovering folders",
            PipelineStage::ClassifyContent => "Classifying records",
            PipelineStage::ClassifyFiles => "Classifying documents",
            PipelineStage::Prepare => "Preparing inputs",
            PipelineStage::Generate => "Generating reports",
            PipelineStage::Persist => "Uploading reports",
            PipelineStage::Notify => "Sending notifications",
            PipelineStage::Archive => "Archiving root files",
        })
    }
}

/// Events emitted by the pipeline while it runs.
pub enum ProgressEvent {
    Stage {
        stage: PipelineStage,
        folders: usize,
    },
    Completed {
        summary: RunSummary,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for tests and library callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes stage transitions to the log, used by the CLI.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Stage { stage, folders } => {
                info!(folders, "{}", stage);
            }
            ProgressEvent::Completed { summary } => {
                info!("Run finished: {}", summary);
            }
            ProgressEvent::Failed { error } => {
                tracing::error!("Run failed: {}", error);
            }
        }
    }
}
