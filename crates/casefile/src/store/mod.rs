//! Object-store access.
//!
//! The pipeline sees the store as a flat key-value namespace where `/` in a
//! key acts as a folder separator. Listing with a delimiter returns one level
//! of hierarchy per call: keys directly under the prefix, plus the distinct
//! child prefixes (`common_prefixes`) that contain deeper keys.

pub mod filesystem;
pub mod memory;

use crate::error::StoreError;

pub use filesystem::FsObjectStore;
pub use memory::MemoryObjectStore;

/// Path separator used in object keys.
pub const DELIMITER: &str = "/";

/// Result of a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    /// Keys matching the prefix (and, with a delimiter, not nested below it).
    pub keys: Vec<String>,
    /// Child prefixes ending in the delimiter, in lexicographic order.
    pub common_prefixes: Vec<String>,
}

pub trait ObjectStore: Send + Sync {
    /// Top-level folder prefixes of a bucket.
    fn list_prefixes(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_objects(bucket, "", Some(DELIMITER))?
            .common_prefixes)
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<ListResult, StoreError>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError>;

    fn copy_object(&self, bucket: &str, from: &str, to: &str) -> Result<(), StoreError>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// Read-back check used before destructive actions.
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError>;
}

/// Splits a sorted key sequence into direct keys and child prefixes,
/// following conventional delimiter listing semantics.
pub(crate) fn partition_listing<'a, I>(keys: I, prefix: &str, delimiter: Option<&str>) -> ListResult
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = ListResult::default();

    for key in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };

        match delimiter.and_then(|d| rest.find(d).map(|idx| (d, idx))) {
            Some((d, idx)) => {
                let child = format!("{}{}", prefix, &rest[..idx + d.len()]);
                if result.common_prefixes.last() != Some(&child) {
                    result.common_prefixes.push(child);
                }
            }
            None => result.keys.push(key.to_string()),
        }
    }

    result
}

/// Last path segment of a key (`"A/b/report.pdf"` -> `"report.pdf"`).
pub fn file_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Lowercased extension of a key's file name, without the dot.
pub fn extension(key: &str) -> Option<String> {
    let name = file_name(key);
    name.rfind('.')
        .filter(|&idx| idx + 1 < name.len())
        .map(|idx| name[idx + 1..].to_ascii_lowercase())
}

/// True when `key` sits directly under `folder` (no further separator).
pub fn is_root_file(folder: &str, key: &str) -> bool {
    match key.strip_prefix(folder) {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

/// Folder display name without the trailing separator.
pub fn folder_name(folder: &str) -> &str {
    folder.trim_end_matches('/')
}

/// Ensures a folder prefix ends with exactly one separator.
pub fn normalize_folder(folder: &str) -> String {
    format!("{}/", folder.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_with_delimiter() {
        let keys = ["A/x.pdf", "A/sub/y.pdf", "A/sub/z.pdf", "A/zz.docx", "B/w.txt"];
        let result = partition_listing(keys, "A/", Some("/"));

        assert_eq!(result.keys, vec!["A/x.pdf", "A/zz.docx"]);
        assert_eq!(result.common_prefixes, vec!["A/sub/"]);
    }

    #[test]
    fn test_partition_without_delimiter_is_recursive() {
        let keys = ["A/x.pdf", "A/sub/y.pdf"];
        let result = partition_listing(keys, "A/", None);

        assert_eq!(result.keys, vec!["A/x.pdf", "A/sub/y.pdf"]);
        assert!(result.common_prefixes.is_empty());
    }

    #[test]
    fn test_partition_top_level() {
        let keys = ["A/x.pdf", "B/y.pdf", "B/z.pdf", "loose.txt"];
        let result = partition_listing(keys, "", Some("/"));

        assert_eq!(result.common_prefixes, vec!["A/", "B/"]);
        assert_eq!(result.keys, vec!["loose.txt"]);
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(file_name("A/b/report.pdf"), "report.pdf");
        assert_eq!(file_name("A/b/"), "b");
        assert_eq!(extension("A/File.PDF"), Some("pdf".to_string()));
        assert_eq!(extension("A/noext"), None);
        assert_eq!(extension("A/trailing."), None);
        assert!(is_root_file("A/", "A/x.pdf"));
        assert!(!is_root_file("A/", "A/sub/x.pdf"));
        assert!(!is_root_file("A/", "A/"));
        assert!(!is_root_file("A/", "B/x.pdf"));
        assert_eq!(folder_name("A/"), "A");
        assert_eq!(normalize_folder("A"), "A/");
        assert_eq!(normalize_folder("A//"), "A/");
    }
}
