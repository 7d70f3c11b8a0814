use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::StoreError;

use super::{partition_listing, ListResult, ObjectStore};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// In-process store, used for dry runs and tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<Buckets>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.with_buckets(|buckets| {
            buckets
                .get(bucket)
                .map(|objects| objects.keys().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn with_buckets<T>(&self, f: impl FnOnce(&mut Buckets) -> T) -> T {
        // A poisoned lock only means another test thread panicked mid-write.
        let mut guard = match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn not_found(bucket: &str, key: &str) -> StoreError {
        StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> Result<ListResult, StoreError> {
        Ok(self.with_buckets(|buckets| match buckets.get(bucket) {
            Some(objects) => partition_listing(objects.keys().map(String::as_str), prefix, delimiter),
            None => ListResult::default(),
        }))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.with_buckets(|buckets| {
            buckets
                .get(bucket)
                .and_then(|objects| objects.get(key))
                .cloned()
                .ok_or_else(|| Self::not_found(bucket, key))
        })
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        self.with_buckets(|buckets| {
            buckets
                .entry(bucket.to_string())
                .or_default()
                .insert(key.to_string(), body.to_vec());
        });
        Ok(())
    }

    fn copy_object(&self, bucket: &str, from: &str, to: &str) -> Result<(), StoreError> {
        self.with_buckets(|buckets| {
            let objects = buckets
                .get_mut(bucket)
                .ok_or_else(|| Self::not_found(bucket, from))?;
            let body = objects
                .get(from)
                .cloned()
                .ok_or_else(|| Self::not_found(bucket, from))?;
            objects.insert(to.to_string(), body);
            Ok(())
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        // Deleting a missing key succeeds, like conventional object stores.
        self.with_buckets(|buckets| {
            if let Some(objects) = buckets.get_mut(bucket) {
                objects.remove(key);
            }
        });
        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.with_buckets(|buckets| {
            buckets
                .get(bucket)
                .is_some_and(|objects| objects.contains_key(key))
        }))
    }
}
