// Property records and their document tabs
pub mod documents;
pub mod folders;
pub mod properties;
pub mod sections;

// People
pub mod tenancies;
pub mod tenants;

// Maintenance
pub mod tasks;

// Compliance
pub mod dashboard;

use crate::storage::FileStorage;
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use slog::Logger;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidationError;

/// One file taken from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Where a client should navigate after a document or folder mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavigationTarget {
    pub property_id: Uuid,
    /// Section slug, e.g. `gas-certificate`
    pub tab: String,
    /// Sub-folder to open; `None` means the tab root
    pub folder_id: Option<Uuid>,
}

/// Option entry in a select2 lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LookupOption {
    pub id: Uuid,
    pub text: String,
}

/// Rows per autocomplete page
pub const LOOKUP_LIMIT: u64 = 10;

/// One page of lookup options and whether another page follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupPage {
    pub results: Vec<LookupOption>,
    pub more: bool,
}

impl LookupPage {
    /// Row offset of a 1-based `page`; missing or zero means the first page.
    pub fn offset(page: Option<u64>) -> u64 {
        page.unwrap_or(1).max(1).saturating_sub(1).saturating_mul(LOOKUP_LIMIT)
    }

    /// Builds a page from up to `LOOKUP_LIMIT + 1` fetched rows; the extra row only flags `more`.
    pub fn from_rows(mut results: Vec<LookupOption>) -> Self {
        let more = results.len() as u64 > LOOKUP_LIMIT;
        results.truncate(LOOKUP_LIMIT as usize);
        Self { results, more }
    }
}

/// Rejects values that are empty once surrounding whitespace is dropped.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Calendar date used for expiry and tenancy checks (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Removes a stored file, treating an already missing file as done.
pub(crate) async fn remove_stored_file(
    storage: &dyn FileStorage,
    logger: &Logger,
    key: &str,
) -> Result<(), crate::errors::ServiceError> {
    if storage.delete(key).await? {
        slog::info!(logger, "stored file deleted"; "key" => key);
    } else {
        slog::warn!(logger, "stored file already absent"; "key" => key);
        tracing::warn!(key = %key, "stored file already absent");
    }
    Ok(())
}
