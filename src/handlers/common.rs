use crate::{errors::ServiceError, services::UploadedFile};
use axum::extract::Multipart;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Files and text fields read from a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl MultipartForm {
    /// Drains `multipart`. Parts carrying a file name are files, the rest are text fields.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) if !file_name.is_empty() => {
                    let bytes = field.bytes().await?;
                    form.files.push(UploadedFile { file_name, bytes });
                }
                Some(_) => {
                    // browsers send an empty part for an untouched file input
                    field.bytes().await?;
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn required_text(&self, name: &str) -> Result<String, ServiceError> {
        self.text(name)
            .ok_or_else(|| ServiceError::ValidationError(format!("'{}' is required", name)))
    }

    /// The single uploaded file of an image form.
    pub fn single_file(mut self) -> Result<UploadedFile, ServiceError> {
        match self.files.len() {
            1 => Ok(self.files.remove(0)),
            0 => Err(ServiceError::ValidationError("An image file is required".to_string())),
            _ => Err(ServiceError::ValidationError(
                "Upload one image at a time".to_string(),
            )),
        }
    }
}

/// `?q=` search filter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// select2 lookup parameters: `?q=` plus the 1-based `?page=`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
}

/// `?folder_id=` of the property detail view. Kept as raw text so a malformed id falls back to the tab root.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FolderQuery {
    pub folder_id: Option<String>,
}

/// Body of delete responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}

/// Body of deletes that send the client back to a parent record.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedChild {
    pub id: Uuid,
    pub parent_id: Uuid,
}
