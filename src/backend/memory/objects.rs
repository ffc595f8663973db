use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::backend::{ObjectRef, ObjectStore};
use crate::error::StorageError;
use crate::utils::content_digest;

struct StoredObject {
    bytes: Vec<u8>,
    token: String,
}

#[derive(Default)]
struct ObjectState {
    objects: HashMap<String, StoredObject>,
    upload_failure: Option<StorageError>,
    delete_failure: Option<StorageError>,
}

/// 进程内对象存储，下载地址形如 `memory://{bucket}/{path}?token={sha256}`
pub struct MemoryObjectStore {
    bucket: String,
    state: Mutex<ObjectState>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            state: Mutex::new(ObjectState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ObjectState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn url_prefix(&self) -> String {
        format!("memory://{}/", self.bucket)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().objects.contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(path).map(|o| o.bytes.clone())
    }

    pub fn fail_uploads(&self, error: Option<StorageError>) {
        self.lock().upload_failure = error;
    }

    pub fn fail_deletes(&self, error: Option<StorageError>) {
        self.lock().delete_failure = error;
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<ObjectRef, StorageError> {
        let mut state = self.lock();
        if let Some(error) = state.upload_failure.clone() {
            return Err(error);
        }
        let token = content_digest(&bytes);
        tracing::debug!("Stored object {} ({} bytes)", path, bytes.len());
        state
            .objects
            .insert(path.to_string(), StoredObject { bytes, token });
        Ok(ObjectRef {
            path: path.to_string(),
        })
    }

    async fn url(&self, object: &ObjectRef) -> Result<String, StorageError> {
        let state = self.lock();
        let stored = state
            .objects
            .get(&object.path)
            .ok_or_else(|| StorageError::NotFound(object.path.clone()))?;
        Ok(format!("{}{}?token={}", self.url_prefix(), object.path, stored.token))
    }

    fn ref_from_url(&self, url: &str) -> Result<ObjectRef, StorageError> {
        let path = url
            .strip_prefix(&self.url_prefix())
            .map(|rest| rest.split('?').next().unwrap_or(rest))
            .filter(|path| !path.is_empty())
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;
        Ok(ObjectRef {
            path: path.to_string(),
        })
    }

    async fn delete(&self, object: &ObjectRef) -> Result<(), StorageError> {
        let mut state = self.lock();
        if let Some(error) = state.delete_failure.clone() {
            return Err(error);
        }
        state
            .objects
            .remove(&object.path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(object.path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn url_resolves_back_to_ref() {
        let store = MemoryObjectStore::new("bucket");
        let object = store.upload("cards/d1/1-a.png", vec![1, 2, 3]).await.unwrap();
        let url = store.url(&object).await.unwrap();
        assert!(url.starts_with("memory://bucket/cards/d1/1-a.png?token="));
        assert_eq!(store.ref_from_url(&url).unwrap(), object);

        store.delete(&object).await.unwrap();
        assert_eq!(
            store.delete(&object).await,
            Err(StorageError::NotFound("cards/d1/1-a.png".into()))
        );
    }

    #[test]
    fn foreign_url_is_rejected() {
        let store = MemoryObjectStore::new("bucket");
        assert!(matches!(
            store.ref_from_url("https://elsewhere/x.png"),
            Err(StorageError::InvalidUrl(_))
        ));
    }
}
