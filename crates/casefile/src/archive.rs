//! Moving a folder's files into a timestamped archive child and back.
//!
//! Archive children are named `MM-DD-YYYY-HHMM-archive/` and are never
//! archived again. Every move is copy-then-delete; unarchive additionally
//! reads the copy back before the original is removed.

use std::sync::Arc;

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::error::StoreError;
use crate::staging::{numbered_name, MAX_NAME_ATTEMPTS};
use crate::store::{self, ObjectStore, DELIMITER};

/// Suffix marking an archive child prefix.
pub const ARCHIVE_SUFFIX: &str = "-archive/";

/// Name fragment of generated reports; these stay archived on unarchive.
pub const REPORT_MARKER: &str = "-report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScope {
    /// Only keys directly under the folder.
    RootFiles,
    /// Root files plus everything below non-archive child prefixes.
    WithSubfolders,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    /// `(from, to)` for every completed move.
    pub moved: Vec<(String, String)>,
    pub skipped: Vec<String>,
    pub failures: Vec<ArchiveFailure>,
}

impl ArchiveReport {
    pub fn merge(&mut self, other: ArchiveReport) {
        self.moved.extend(other.moved);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, key: &str, error: impl std::fmt::Display) {
        warn!("Failed to move {}: {}", key, error);
        self.failures.push(ArchiveFailure {
            key: key.to_string(),
            reason: error.to_string(),
        });
    }
}

/// Archive child name for a point in time, e.g. `03-07-2025-1405-archive/`.
pub fn archive_child_name(at: &DateTime<Local>) -> String {
    format!("{}{}", at.format("%m-%d-%Y-%H%M"), ARCHIVE_SUFFIX)
}

pub fn is_archive_prefix(prefix: &str) -> bool {
    prefix.ends_with(ARCHIVE_SUFFIX)
}

pub struct ArchiveEngine {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ArchiveEngine {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn archive(&self, folder: &str, scope: ArchiveScope) -> Result<ArchiveReport, StoreError> {
        self.archive_at(folder, scope, &Local::now())
    }

    /// Archives into the child named after `at`.
    pub fn archive_at(
        &self,
        folder: &str,
        scope: ArchiveScope,
        at: &DateTime<Local>,
    ) -> Result<ArchiveReport, StoreError> {
        let folder = store::normalize_folder(folder);
        let listing = self
            .store
            .list_objects(&self.bucket, &folder, Some(DELIMITER))?;

        let root_files: Vec<&String> = listing.keys.iter().filter(|k| **k != folder).collect();
        let subfolders: Vec<&String> = match scope {
            ArchiveScope::RootFiles => Vec::new(),
            ArchiveScope::WithSubfolders => listing
                .common_prefixes
                .iter()
                .filter(|p| !is_archive_prefix(p))
                .collect(),
        };

        let mut report = ArchiveReport::default();
        if root_files.is_empty() && subfolders.is_empty() {
            debug!("No files to archive in {}", folder);
            return Ok(report);
        }

        let archive_prefix = format!("{}{}", folder, archive_child_name(at));

        for key in root_files {
            let destination = format!("{}{}", archive_prefix, store::file_name(key));
            self.move_into(key, &destination, false, &mut report);
        }

        for subfolder in subfolders {
            let name = store::file_name(subfolder);
            let objects = match self.store.list_objects(&self.bucket, subfolder, None) {
                Ok(listing) => listing.keys,
                Err(e) => {
                    report.fail(subfolder, e);
                    continue;
                }
            };

            for key in objects.iter().filter(|k| !k.ends_with('/')) {
                let destination = format!("{}{}/{}", archive_prefix, name, store::file_name(key));
                self.move_into(key, &destination, false, &mut report);
            }
        }

        info!(
            "Archived {} file(s) of {} into {} ({} failed)",
            report.moved.len(),
            folder,
            archive_prefix,
            report.failures.len()
        );
        Ok(report)
    }

    /// Restores files of the first archive child to the folder root.
    ///
    /// Report files stay archived. An original is only deleted after its
    /// copy has been read back.
    pub fn unarchive(&self, folder: &str) -> Result<ArchiveReport, StoreError> {
        let folder = store::normalize_folder(folder);
        let listing = self
            .store
            .list_objects(&self.bucket, &folder, Some(DELIMITER))?;

        let mut report = ArchiveReport::default();
        let Some(archive_prefix) = listing.common_prefixes.iter().find(|p| is_archive_prefix(p)) else {
            debug!("No archive child in {}", folder);
            return Ok(report);
        };

        let archived = self
            .store
            .list_objects(&self.bucket, archive_prefix, Some(DELIMITER))?;

        for key in archived.keys.iter().filter(|k| *k != archive_prefix) {
            let name = store::file_name(key);
            if name.contains(REPORT_MARKER) {
                debug!("Keeping report {} archived", key);
                report.skipped.push(key.clone());
                continue;
            }
            let destination = format!("{}{}", folder, name);
            self.move_into(key, &destination, true, &mut report);
        }

        info!(
            "Unarchived {} file(s) from {} ({} skipped, {} failed)",
            report.moved.len(),
            archive_prefix,
            report.skipped.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Root-file archive of every top-level folder in the bucket.
    pub fn archive_all(&self) -> Result<ArchiveReport, StoreError> {
        let mut report = ArchiveReport::default();
        for folder in self.store.list_prefixes(&self.bucket)? {
            match self.archive(&folder, ArchiveScope::RootFiles) {
                Ok(folder_report) => report.merge(folder_report),
                Err(e) => report.fail(&folder, e),
            }
        }
        Ok(report)
    }

    /// Unarchives the first `count` top-level folders in listing order.
    pub fn unarchive_folders(&self, count: usize) -> Result<ArchiveReport, StoreError> {
        let mut report = ArchiveReport::default();
        for folder in self.store.list_prefixes(&self.bucket)?.into_iter().take(count) {
            match self.unarchive(&folder) {
                Ok(folder_report) => report.merge(folder_report),
                Err(e) => report.fail(&folder, e),
            }
        }
        Ok(report)
    }

    fn move_into(&self, from: &str, candidate: &str, verify: bool, report: &mut ArchiveReport) {
        match self.transfer(from, candidate, verify) {
            Ok(to) => {
                debug!("Moved {} to {}", from, to);
                report.moved.push((from.to_string(), to));
            }
            Err(e) => report.fail(from, e),
        }
    }

    fn transfer(&self, from: &str, candidate: &str, verify: bool) -> Result<String, StoreError> {
        let to = self.free_destination(candidate)?;
        self.store.copy_object(&self.bucket, from, &to)?;

        if verify && !self.store.exists(&self.bucket, &to)? {
            return Err(StoreError::CopyNotVerified {
                from: from.to_string(),
                to,
            });
        }

        self.store.delete_object(&self.bucket, from)?;
        Ok(to)
    }

    /// First of `key`, `name_2.ext`, `name_3.ext`, ... that does not exist yet.
    fn free_destination(&self, key: &str) -> Result<String, StoreError> {
        let (parent, name) = match key.rfind('/') {
            Some(idx) => key.split_at(idx + 1),
            None => ("", key),
        };

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let candidate = format!("{}{}", parent, numbered_name(name, counter));
            if !self.store.exists(&self.bucket, &candidate)? {
                return Ok(candidate);
            }
        }
        Err(StoreError::NameExhausted(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ListResult, MemoryObjectStore};
    use chrono::TimeZone;

    const BUCKET: &str = "cases";

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 7, hour, minute, 0).unwrap()
    }

    fn seeded(keys: &[&str]) -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        for key in keys {
            store.put_object(BUCKET, key, key.as_bytes()).unwrap();
        }
        store
    }

    fn engine(store: &Arc<MemoryObjectStore>) -> ArchiveEngine {
        ArchiveEngine::new(store.clone(), BUCKET)
    }

    #[test]
    fn test_archive_child_name() {
        assert_eq!(archive_child_name(&at(14, 5)), "03-07-2025-1405-archive/");
        assert!(is_archive_prefix("A/03-07-2025-1405-archive/"));
        assert!(!is_archive_prefix("A/attachments/"));
    }

    #[test]
    fn test_archive_root_files_only() {
        let store = seeded(&["A/rfp.pdf", "A/email.json", "A/sub/inner.pdf"]);
        let report = engine(&store)
            .archive_at("A/", ArchiveScope::RootFiles, &at(14, 5))
            .unwrap();

        assert_eq!(report.moved.len(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(
            store.keys(BUCKET),
            vec![
                "A/03-07-2025-1405-archive/email.json",
                "A/03-07-2025-1405-archive/rfp.pdf",
                "A/sub/inner.pdf",
            ]
        );
    }

    #[test]
    fn test_archive_with_subfolders_flattens_one_level() {
        let store = seeded(&[
            "A/rfp.pdf",
            "A/attachments/a.pdf",
            "A/attachments/deep/b.pdf",
            "A/01-01-2024-0900-archive/old.pdf",
        ]);
        engine(&store)
            .archive_at("A", ArchiveScope::WithSubfolders, &at(9, 30))
            .unwrap();

        assert_eq!(
            store.keys(BUCKET),
            vec![
                "A/01-01-2024-0900-archive/old.pdf",
                "A/03-07-2025-0930-archive/attachments/a.pdf",
                "A/03-07-2025-0930-archive/attachments/b.pdf",
                "A/03-07-2025-0930-archive/rfp.pdf",
            ]
        );
    }

    #[test]
    fn test_archive_is_idempotent_without_new_files() {
        let store = seeded(&["A/rfp.pdf"]);
        let engine = engine(&store);
        engine.archive_at("A/", ArchiveScope::RootFiles, &at(10, 0)).unwrap();
        let before = store.keys(BUCKET);

        let second = engine.archive_at("A/", ArchiveScope::RootFiles, &at(10, 1)).unwrap();
        assert_eq!(second, ArchiveReport::default());
        assert_eq!(store.keys(BUCKET), before);

        let with_subfolders = engine
            .archive_at("A/", ArchiveScope::WithSubfolders, &at(10, 2))
            .unwrap();
        assert!(with_subfolders.moved.is_empty());
        assert_eq!(store.keys(BUCKET), before);
    }

    #[test]
    fn test_archive_collision_gets_numbered_name() {
        let store = seeded(&["A/rfp.pdf", "A/03-07-2025-1405-archive/rfp.pdf"]);
        let report = engine(&store)
            .archive_at("A/", ArchiveScope::RootFiles, &at(14, 5))
            .unwrap();

        assert_eq!(
            report.moved,
            vec![(
                "A/rfp.pdf".to_string(),
                "A/03-07-2025-1405-archive/rfp_2.pdf".to_string()
            )]
        );
        assert_eq!(
            store.get_object(BUCKET, "A/03-07-2025-1405-archive/rfp.pdf").unwrap(),
            b"A/03-07-2025-1405-archive/rfp.pdf"
        );
    }

    #[test]
    fn test_archive_then_unarchive_restores_names_except_reports() {
        let store = seeded(&["A/rfp.pdf", "A/email.json", "A/RS3-24-0001-report.pdf"]);
        let engine = engine(&store);
        engine.archive_at("A/", ArchiveScope::RootFiles, &at(8, 0)).unwrap();

        let report = engine.unarchive("A/").unwrap();

        assert_eq!(report.moved.len(), 2);
        assert_eq!(report.skipped, vec!["A/03-07-2025-0800-archive/RS3-24-0001-report.pdf"]);
        assert_eq!(
            store.keys(BUCKET),
            vec![
                "A/03-07-2025-0800-archive/RS3-24-0001-report.pdf",
                "A/email.json",
                "A/rfp.pdf",
            ]
        );
        assert_eq!(store.get_object(BUCKET, "A/rfp.pdf").unwrap(), b"A/rfp.pdf");
    }

    #[test]
    fn test_unarchive_without_archive_is_noop() {
        let store = seeded(&["A/rfp.pdf"]);
        assert_eq!(engine(&store).unarchive("A/").unwrap(), ArchiveReport::default());
        assert_eq!(store.keys(BUCKET), vec!["A/rfp.pdf"]);
    }

    #[test]
    fn test_unarchive_uses_first_archive_child() {
        let store = seeded(&[
            "A/01-01-2024-0900-archive/one.pdf",
            "A/02-01-2024-0900-archive/two.pdf",
        ]);
        engine(&store).unarchive("A/").unwrap();
        assert_eq!(
            store.keys(BUCKET),
            vec!["A/02-01-2024-0900-archive/two.pdf", "A/one.pdf"]
        );
    }

    /// Store whose copies can never be read back.
    struct Unverifiable(MemoryObjectStore);

    impl ObjectStore for Unverifiable {
        fn list_objects(
            &self,
            bucket: &str,
            prefix: &str,
            delimiter: Option<&str>,
        ) -> Result<ListResult, StoreError> {
            self.0.list_objects(bucket, prefix, delimiter)
        }
        fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
            self.0.get_object(bucket, key)
        }
        fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
            self.0.put_object(bucket, key, body)
        }
        fn copy_object(&self, _bucket: &str, _from: &str, _to: &str) -> Result<(), StoreError> {
            Ok(())
        }
        fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
            self.0.delete_object(bucket, key)
        }
        fn exists(&self, _bucket: &str, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[test]
    fn test_unarchive_keeps_original_when_copy_is_missing() {
        let inner = MemoryObjectStore::new();
        inner
            .put_object(BUCKET, "A/01-01-2024-0900-archive/rfp.pdf", b"x")
            .unwrap();
        let store = Arc::new(Unverifiable(inner));
        let engine = ArchiveEngine::new(store.clone(), BUCKET);

        let report = engine.unarchive("A/").unwrap();

        assert!(report.moved.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("could not be verified"));
        assert_eq!(store.0.keys(BUCKET), vec!["A/01-01-2024-0900-archive/rfp.pdf"]);
    }

    #[test]
    fn test_archive_all_and_unarchive_folders() {
        let store = seeded(&["A/a.pdf", "B/b.pdf", "C/c.pdf"]);
        let engine = engine(&store);

        let archived = engine.archive_all().unwrap();
        assert_eq!(archived.moved.len(), 3);
        assert!(store.keys(BUCKET).iter().all(|k| k.contains(ARCHIVE_SUFFIX)));

        let restored = engine.unarchive_folders(2).unwrap();
        assert_eq!(restored.moved.len(), 2);
        let keys = store.keys(BUCKET);
        assert!(keys.contains(&"A/a.pdf".to_string()));
        assert!(keys.contains(&"B/b.pdf".to_string()));
        assert!(!keys.contains(&"C/c.pdf".to_string()));
    }
}
