use std::fmt;

use uuid::Uuid;

use crate::archive::ArchiveReport;
use crate::registry::{FolderRegistry, RoutingDecision};

use super::error::PipelineWarning;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub registry: FolderRegistry,
    pub notified: usize,
    pub archived: ArchiveReport,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineRun {
    pub fn new(run_id: Uuid, registry: FolderRegistry) -> Self {
        Self {
            run_id,
            registry,
            notified: 0,
            archived: ArchiveReport::default(),
            warnings: Vec::new(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let folders = &self.registry;
        RunSummary {
            folders: folders.len(),
            reports: folders.routed(RoutingDecision::ReportNeeded).count(),
            amendments: folders.routed(RoutingDecision::AmendmentOther).count(),
            indeterminate: folders
                .iter()
                .filter(|f| f.classification_error.is_some())
                .count(),
            generated: folders.iter().filter(|f| f.artifact_path().is_some()).count(),
            failed: folders.iter().filter(|f| f.artifact_error().is_some()).count(),
            persisted: folders.iter().filter(|f| f.persisted_key.is_some()).count(),
            notified: self.notified,
            archived_files: self.archived.moved.len(),
            warnings: self.warnings.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub folders: usize,
    pub reports: usize,
    pub amendments: usize,
    pub indeterminate: usize,
    pub generated: usize,
    pub failed: usize,
    pub persisted: usize,
    pub notified: usize,
    pub archived_files: usize,
    pub warnings: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folder(s): {} report, {} amendment, {} indeterminate; {} generated, {} failed, {} uploaded, {} notified, {} file(s) archived, {} warning(s)",
            self.folders,
            self.reports,
            self.amendments,
            self.indeterminate,
            self.generated,
            self.failed,
            self.persisted,
            self.notified,
            self.archived_files,
            self.warnings
        )
    }
}
