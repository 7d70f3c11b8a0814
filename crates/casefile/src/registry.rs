//! The per-run table of case folders.
//!
//! Built once by discovery and then passed to every pipeline stage, which
//! fills in its own fields. Folders are never removed during a run.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::classify::FileVerdict;
use crate::error::StoreError;
use crate::record::CaseRecord;
use crate::report::BidRecommendation;
use crate::store::{self, ObjectStore, DELIMITER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingDecision {
    #[default]
    Unclassified,
    ReportNeeded,
    AmendmentOther,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FolderStage {
    Discovered,
    ContentClassified,
    FileClassified,
    Prepared,
    ReportGenerated,
    AmendmentPrepared,
    AmendmentGenerated,
    Persisted,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedDocument {
    pub key: String,
    pub verdict: FileVerdict,
}

#[derive(Debug, Clone)]
pub struct CaseFolder {
    pub folder_key: String,
    pub root_files: Vec<String>,
    pub notable_files: Vec<String>,
    pub record_key: Option<String>,
    pub ignored_record_keys: Vec<String>,
    pub record: Option<CaseRecord>,
    pub record_error: Option<String>,
    pub routing: RoutingDecision,
    pub classification_error: Option<String>,
    pub classified_documents: Vec<ClassifiedDocument>,
    pub target_count: usize,
    pub combined_artifact: Option<PathBuf>,
    pub record_artifact: Option<PathBuf>,
    pub derived_artifact: Option<Result<PathBuf, String>>,
    pub bid_recommendation: Option<BidRecommendation>,
    pub persisted_key: Option<String>,
    pub stage: FolderStage,
}

impl CaseFolder {
    pub fn new(folder_key: impl Into<String>, root_files: Vec<String>) -> Self {
        Self {
            folder_key: folder_key.into(),
            root_files,
            notable_files: Vec::new(),
            record_key: None,
            ignored_record_keys: Vec::new(),
            record: None,
            record_error: None,
            routing: RoutingDecision::Unclassified,
            classification_error: None,
            classified_documents: Vec::new(),
            target_count: 0,
            combined_artifact: None,
            record_artifact: None,
            derived_artifact: None,
            bid_recommendation: None,
            persisted_key: None,
            stage: FolderStage::Discovered,
        }
    }

    pub fn name(&self) -> &str {
        store::folder_name(&self.folder_key)
    }

    /// Target documents in listing order.
    pub fn target_keys(&self) -> impl Iterator<Item = &str> {
        self.classified_documents
            .iter()
            .filter(|d| d.verdict.is_target)
            .map(|d| d.key.as_str())
    }

    /// Path of a successfully generated artifact.
    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match &self.derived_artifact {
            Some(Ok(path)) => Some(path),
            _ => None,
        }
    }

    pub fn artifact_error(&self) -> Option<&str> {
        match &self.derived_artifact {
            Some(Err(reason)) => Some(reason),
            _ => None,
        }
    }

    /// Routing is set once; later attempts are ignored.
    pub fn route(&mut self, decision: RoutingDecision) {
        if self.routing == RoutingDecision::Unclassified {
            self.routing = decision;
        } else {
            warn!(
                "Routing of {} is already {:?}; ignoring {:?}",
                self.folder_key, self.routing, decision
            );
        }
    }

    pub fn advance(&mut self, stage: FolderStage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }
}

fn has_extension(key: &str, extension: &str) -> bool {
    let name = store::file_name(key).to_ascii_lowercase();
    name.ends_with(&format!(".{}", extension.to_ascii_lowercase()))
}

#[derive(Debug, Default)]
pub struct FolderRegistry {
    folders: Vec<CaseFolder>,
}

impl FolderRegistry {
    pub fn new(folders: Vec<CaseFolder>) -> Self {
        Self { folders }
    }

    /// Lists top-level prefixes and keeps those holding root files.
    ///
    /// Only the prefix enumeration can fail; per-folder problems are logged
    /// and the folder is skipped or carries a `record_error`.
    pub fn discover(
        store: &dyn ObjectStore,
        bucket: &str,
        record_extension: &str,
    ) -> Result<Self, StoreError> {
        let prefixes = store.list_prefixes(bucket)?;
        debug!("Found {} top-level prefix(es) in {}", prefixes.len(), bucket);

        let mut folders = Vec::new();
        for prefix in prefixes {
            let listing = match store.list_objects(bucket, &prefix, Some(DELIMITER)) {
                Ok(listing) => listing,
                Err(e) => {
                    warn!("Skipping {}: {}", prefix, e);
                    continue;
                }
            };

            let root_files: Vec<String> = listing
                .keys
                .into_iter()
                .filter(|key| store::is_root_file(&prefix, key))
                .collect();
            if root_files.is_empty() {
                debug!("No root files in {}", prefix);
                continue;
            }

            let mut folder = CaseFolder::new(prefix, root_files);
            attach_record_fields(&mut folder, store, bucket, record_extension);
            folders.push(folder);
        }

        info!("Discovered {} folder(s) with files in the root", folders.len());
        Ok(Self { folders })
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaseFolder> {
        self.folders.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CaseFolder> {
        self.folders.iter_mut()
    }

    pub fn get(&self, folder_key: &str) -> Option<&CaseFolder> {
        self.folders.iter().find(|f| f.folder_key == folder_key)
    }

    pub fn routed(&self, routing: RoutingDecision) -> impl Iterator<Item = &CaseFolder> {
        self.folders.iter().filter(move |f| f.routing == routing)
    }

    pub fn routed_mut(&mut self, routing: RoutingDecision) -> impl Iterator<Item = &mut CaseFolder> {
        self.folders.iter_mut().filter(move |f| f.routing == routing)
    }
}

fn attach_record_fields(
    folder: &mut CaseFolder,
    store: &dyn ObjectStore,
    bucket: &str,
    record_extension: &str,
) {
    folder.notable_files = folder
        .root_files
        .iter()
        .filter(|key| {
            has_extension(key, "pdf") || has_extension(key, "docx") || has_extension(key, record_extension)
        })
        .cloned()
        .collect();

    let mut records = folder
        .notable_files
        .iter()
        .filter(|key| has_extension(key, record_extension))
        .cloned();
    folder.record_key = records.next();
    folder.ignored_record_keys = records.collect();

    if !folder.ignored_record_keys.is_empty() {
        warn!(
            "{} holds {} record files; using {} and ignoring {:?}",
            folder.folder_key,
            folder.ignored_record_keys.len() + 1,
            folder.record_key.as_deref().unwrap_or_default(),
            folder.ignored_record_keys
        );
    }

    let Some(record_key) = folder.record_key.as_deref() else {
        return;
    };

    let loaded = store
        .get_object(bucket, record_key)
        .map_err(|e| e.to_string())
        .and_then(|bytes| CaseRecord::from_json(&bytes).map_err(|e| e.to_string()));
    match loaded {
        Ok(record) => folder.record = Some(record),
        Err(reason) => {
            warn!("Could not load record {}: {}", record_key, reason);
            folder.record_error = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VerdictReason;
    use crate::store::MemoryObjectStore;

    const BUCKET: &str = "cases";

    fn store_with(objects: &[(&str, &[u8])]) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        for (key, body) in objects {
            store.put_object(BUCKET, key, body).unwrap();
        }
        store
    }

    #[test]
    fn test_discover_keeps_folders_with_root_files() {
        let store = store_with(&[
            ("A/rfp.pdf", b"%PDF"),
            ("A/email.json", br#"{"subject": "S", "body": "B", "from": "x"}"#),
            ("A/notes.txt", b"n"),
            ("B/", b""),
            ("B/01-01-2024-0900-archive/old.pdf", b"%PDF"),
            ("C/sub/only.pdf", b"%PDF"),
        ]);

        let registry = FolderRegistry::discover(&store, BUCKET, "json").unwrap();

        assert_eq!(registry.len(), 1);
        let folder = registry.get("A/").unwrap();
        assert_eq!(folder.root_files, vec!["A/email.json", "A/notes.txt", "A/rfp.pdf"]);
        assert_eq!(folder.notable_files, vec!["A/email.json", "A/rfp.pdf"]);
        assert_eq!(folder.record_key.as_deref(), Some("A/email.json"));

        let record = folder.record.as_ref().unwrap();
        assert_eq!(record.subject, "S");
        assert_eq!(record.extra["from"], "x");
        assert_eq!(folder.stage, FolderStage::Discovered);
        assert_eq!(folder.routing, RoutingDecision::Unclassified);
    }

    #[test]
    fn test_first_record_wins_and_rest_are_reported() {
        let store = store_with(&[
            ("A/a.json", br#"{"subject": "first"}"#),
            ("A/b.JSON", br#"{"subject": "second"}"#),
        ]);

        let registry = FolderRegistry::discover(&store, BUCKET, "json").unwrap();
        let folder = registry.get("A/").unwrap();

        assert_eq!(folder.record_key.as_deref(), Some("A/a.json"));
        assert_eq!(folder.ignored_record_keys, vec!["A/b.JSON"]);
        assert_eq!(folder.record.as_ref().unwrap().subject, "first");
    }

    #[test]
    fn test_broken_record_is_kept_as_error() {
        let store = store_with(&[("A/email.json", b"not json")]);
        let registry = FolderRegistry::discover(&store, BUCKET, "json").unwrap();
        let folder = registry.get("A/").unwrap();

        assert!(folder.record.is_none());
        assert!(folder.record_error.as_deref().unwrap().contains("not valid JSON"));
    }

    #[test]
    fn test_multi_part_record_extension() {
        let store = store_with(&[("A/msg.eml.json", br#"{"subject": "x"}"#), ("A/other.json", b"{}")]);
        let registry = FolderRegistry::discover(&store, BUCKET, "eml.json").unwrap();
        let folder = registry.get("A/").unwrap();

        assert_eq!(folder.record_key.as_deref(), Some("A/msg.eml.json"));
        assert!(folder.ignored_record_keys.is_empty());
    }

    #[test]
    fn test_empty_bucket_yields_empty_registry() {
        let store = MemoryObjectStore::new();
        assert!(FolderRegistry::discover(&store, BUCKET, "json").unwrap().is_empty());
    }

    #[test]
    fn test_routing_is_set_once_and_stage_only_advances() {
        let mut folder = CaseFolder::new("A/", vec!["A/x.pdf".to_string()]);
        folder.route(RoutingDecision::ReportNeeded);
        folder.route(RoutingDecision::AmendmentOther);
        assert_eq!(folder.routing, RoutingDecision::ReportNeeded);

        folder.advance(FolderStage::Prepared);
        folder.advance(FolderStage::ContentClassified);
        assert_eq!(folder.stage, FolderStage::Prepared);
    }

    #[test]
    fn test_target_keys_and_artifact_accessors() {
        let mut folder = CaseFolder::new("A/", Vec::new());
        folder.classified_documents = vec![
            ClassifiedDocument {
                key: "A/RFP.pdf".to_string(),
                verdict: FileVerdict::target(VerdictReason::StrongIndicator),
            },
            ClassifiedDocument {
                key: "A/Q&A.pdf".to_string(),
                verdict: FileVerdict::rejected(VerdictReason::NegativePattern),
            },
        ];
        assert_eq!(folder.target_keys().collect::<Vec<_>>(), vec!["A/RFP.pdf"]);

        folder.derived_artifact = Some(Err("boom".to_string()));
        assert_eq!(folder.artifact_error(), Some("boom"));
        assert!(folder.artifact_path().is_none());
    }
}
