use super::{validate_key, FileStorage, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

/// Process-local storage used by tests and throwaway environments.
#[derive(Debug, Default)]
pub struct InMemoryFileStorage {
    files: DashMap<String, Bytes>,
    url_prefix: String,
}

impl InMemoryFileStorage {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            files: DashMap::new(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn read(&self, key: &str) -> Option<Bytes> {
        self.files.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        validate_key(key)?;
        self.files.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.files.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.files.contains_key(key))
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleting_missing_key_reports_false() {
        let storage = InMemoryFileStorage::new("/media/");
        storage.put("a/b.txt", Bytes::from("x")).await.unwrap();

        assert!(storage.delete("a/b.txt").await.unwrap());
        assert!(!storage.delete("a/b.txt").await.unwrap());
        assert!(storage.is_empty());
        assert_eq!(storage.url("a/b.txt"), "/media/a/b.txt");
    }
}
