//! Uploaded file storage.
//!
//! Rows only hold a storage key such as
//! `property_documents/2024/05/01/lease.pdf`; the bytes live behind a
//! [`FileStorage`] backend. Keys are never overwritten: a clashing upload
//! gets a random suffix before its extension.

pub mod local;
pub mod memory;
pub mod s3;

use crate::config::StorageConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use metrics::counter;
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalFileStorage;
pub use memory::InMemoryFileStorage;
pub use s3::S3FileStorage;

const UNIQUE_SUFFIX_LEN: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 10;
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "heif"];

static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static pattern compiles"));

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Could not find a free name for {0}")]
    NameExhausted(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::StorageError(err.to_string())
    }
}

/// Where an upload is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadArea {
    PropertyDocuments,
    TenantImages,
    TaskImages,
}

impl UploadArea {
    /// Directory part of the key for an upload made on `date`
    pub fn directory(&self, date: NaiveDate) -> String {
        let dated = |root: &str| {
            format!(
                "{}/{:04}/{:02}/{:02}",
                root,
                date.year(),
                date.month(),
                date.day()
            )
        };
        match self {
            UploadArea::PropertyDocuments => dated("property_documents"),
            UploadArea::TenantImages => dated("tenant_images"),
            UploadArea::TaskImages => "task_images".to_string(),
        }
    }
}

/// Storage backend for uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Short backend name for logs and metrics
    fn backend_name(&self) -> &'static str;

    /// Writes `bytes` under `key`, replacing nothing callers did not ask for
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError>;

    /// Removes `key`; returns `false` when it was already gone
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Address a client can fetch the file from
    fn url(&self, key: &str) -> String;

    /// Stores an upload under `area`, returning the key actually used.
    async fn save(
        &self,
        area: UploadArea,
        date: NaiveDate,
        file_name: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError> {
        let directory = area.directory(date);
        let name = sanitize_file_name(file_name);
        let mut key = format!("{}/{}", directory, name);

        let mut attempts = 0;
        while self.exists(&key).await? {
            attempts += 1;
            if attempts > MAX_NAME_ATTEMPTS {
                return Err(StorageError::NameExhausted(key));
            }
            key = format!("{}/{}", directory, with_random_suffix(&name));
        }

        self.put(&key, bytes).await?;
        counter!("pynnacle_storage.saved", 1, "backend" => self.backend_name());
        Ok(key)
    }
}

/// Builds the configured backend.
pub fn build_storage(config: &StorageConfig) -> Result<Arc<dyn FileStorage>, StorageError> {
    match config.backend.to_ascii_lowercase().as_str() {
        "local" => Ok(Arc::new(LocalFileStorage::new(
            &config.media_root,
            &config.media_url,
        ))),
        "memory" => Ok(Arc::new(InMemoryFileStorage::new(&config.media_url))),
        "s3" => Ok(Arc::new(S3FileStorage::from_config(config)?)),
        other => Err(StorageError::Backend(format!(
            "unknown storage backend '{}'",
            other
        ))),
    }
}

/// Reduces an uploaded name to a safe final path segment.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let spaced = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = INVALID_NAME_CHARS.replace_all(&spaced, "");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_random_suffix(name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UNIQUE_SUFFIX_LEN)
        .map(char::from)
        .collect();

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}

/// Whether an uploaded name carries one of the accepted image extensions
pub fn is_image_file_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Rejects keys that could escape the storage root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == ".." || segment == ".")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("lease agreement.pdf", "lease_agreement.pdf" ; "spaces become underscores")]
    #[test_case("../../etc/passwd", "passwd" ; "path components are dropped")]
    #[test_case("C:\\Users\\me\\scan.png", "scan.png" ; "windows paths are dropped")]
    #[test_case("gas cert (2024).pdf", "gas_cert_2024.pdf" ; "punctuation is removed")]
    #[test_case(".hidden", "hidden" ; "leading dots are stripped")]
    #[test_case("   ", "file" ; "blank names fall back")]
    fn sanitizes_upload_names(raw: &str, expected: &str) {
        assert_eq!(sanitize_file_name(raw), expected);
    }

    #[test]
    fn dated_areas_partition_by_day() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            UploadArea::PropertyDocuments.directory(date),
            "property_documents/2024/05/01"
        );
        assert_eq!(
            UploadArea::TenantImages.directory(date),
            "tenant_images/2024/05/01"
        );
        assert_eq!(UploadArea::TaskImages.directory(date), "task_images");
    }

    #[test]
    fn random_suffix_keeps_extension() {
        let renamed = with_random_suffix("lease.pdf");
        assert!(renamed.starts_with("lease_"));
        assert!(renamed.ends_with(".pdf"));
        assert_eq!(renamed.len(), "lease_.pdf".len() + UNIQUE_SUFFIX_LEN);
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image_file_name("kitchen.JPG"));
        assert!(is_image_file_name("boiler.heic"));
        assert!(!is_image_file_name("notes.pdf"));
        assert!(!is_image_file_name("no_extension"));
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        assert!(validate_key("property_documents/2024/05/01/a.pdf").is_ok());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a/../b").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
    }

    #[tokio::test]
    async fn save_never_overwrites_existing_key() {
        let storage = InMemoryFileStorage::new("/media");
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let first = storage
            .save(UploadArea::PropertyDocuments, date, "lease.pdf", Bytes::from("one"))
            .await
            .unwrap();
        let second = storage
            .save(UploadArea::PropertyDocuments, date, "lease.pdf", Bytes::from("two"))
            .await
            .unwrap();

        assert_eq!(first, "property_documents/2024/05/01/lease.pdf");
        assert_ne!(first, second);
        assert_eq!(storage.read(&first).unwrap(), Bytes::from("one"));
        assert_eq!(storage.read(&second).unwrap(), Bytes::from("two"));
    }
}
