use super::{validate_key, FileStorage, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Files kept on the local filesystem under `root`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        debug!(key = %key, size = bytes.len(), "stored file");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UploadArea;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_and_delete_round_trip_on_disk() {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "/media");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();

        let key = storage
            .save(UploadArea::TenantImages, date, "id photo.jpg", Bytes::from("jpeg"))
            .await
            .unwrap();

        assert_eq!(key, "tenant_images/2024/02/29/id_photo.jpg");
        let on_disk = dir.path().join("tenant_images/2024/02/29/id_photo.jpg");
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"jpeg");
        assert_eq!(storage.url(&key), "/media/tenant_images/2024/02/29/id_photo.jpg");

        assert!(storage.delete(&key).await.unwrap());
        assert!(!on_disk.exists());
        assert!(!storage.delete(&key).await.unwrap());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "/media");
        let err = storage
            .put("../outside.txt", Bytes::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
