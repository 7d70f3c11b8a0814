use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::StoreError;

use super::{partition_listing, ListResult, ObjectStore};

/// Directory-backed object store: `bucket/key` lives at `root/bucket/key`.
///
/// Empty directories left behind by deletes are pruned, so a folder with no
/// remaining objects disappears from listings the same way it would in a
/// conventional object store.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        validate_segment(bucket, bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.ends_with('/') {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "key must name an object".to_string(),
            });
        }

        let mut path = self.bucket_dir(bucket)?;
        for segment in key.split('/') {
            validate_segment(key, segment)?;
            path.push(segment);
        }
        Ok(path)
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        Ok(())
    }

    /// Removes now-empty directories between `path` and the bucket root.
    fn prune_empty_parents(&self, path: &Path, bucket_dir: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == bucket_dir || !dir.starts_with(bucket_dir) {
                break;
            }
            // remove_dir fails on non-empty directories, which ends the walk
            if std::fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }

    fn io_error(path: &Path, bucket: &str, key: &str, source: std::io::Error) -> StoreError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

fn validate_segment(key: &str, segment: &str) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if segment.is_empty() {
        return Err(invalid("empty path segment"));
    }
    if segment.contains('\\') {
        return Err(invalid("backslash in path segment"));
    }
    match Path::new(segment).components().next() {
        Some(Component::Normal(_)) => Ok(()),
        _ => Err(invalid("path traversal or absolute segment")),
    }
}

impl ObjectStore for FsObjectStore {
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<ListResult, StoreError> {
        let bucket_dir = self.bucket_dir(bucket)?;

        // Only walk the deepest directory the prefix fully names.
        let walk_root = match prefix.rfind('/') {
            Some(idx) => bucket_dir.join(&prefix[..idx]),
            None => bucket_dir.clone(),
        };
        if !walk_root.is_dir() {
            return Ok(ListResult::default());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&walk_root) {
            let entry = entry.map_err(|e| StoreError::List {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&bucket_dir) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();

        Ok(partition_listing(
            keys.iter().map(String::as_str),
            prefix,
            delimiter,
        ))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        std::fs::read(&path).map_err(|e| Self::io_error(&path, bucket, key, e))
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        self.ensure_parent(&path)?;
        std::fs::write(&path, body).map_err(|e| StoreError::Io { path, source: e })
    }

    fn copy_object(&self, bucket: &str, from: &str, to: &str) -> Result<(), StoreError> {
        let src = self.object_path(bucket, from)?;
        let dst = self.object_path(bucket, to)?;
        self.ensure_parent(&dst)?;
        std::fs::copy(&src, &dst)
            .map(|_| ())
            .map_err(|e| Self::io_error(&src, bucket, from, e))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Io { path, source: e }),
        }
        self.prune_empty_parents(&path, &self.bucket_dir(bucket)?);
        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        let path = self.object_path(bucket, key)?;
        Ok(path.is_file())
    }
}
