use crate::{
    db::DbPool,
    entities::{document, folder},
    errors::ServiceError,
    services::{remove_stored_file, sections::DocumentTab, today, NavigationTarget, UploadedFile},
    storage::{FileStorage, UploadArea},
};
use metrics::counter;
use sea_orm::{ActiveModelTrait, EntityTrait, NotSet, Set};
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for uploaded property documents
#[derive(Clone)]
pub struct DocumentService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn FileStorage>,
    logger: Logger,
}

impl DocumentService {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, logger: Logger) -> Self {
        Self {
            db_pool,
            storage,
            logger,
        }
    }

    /// Stores each file and files it in `folder`.
    #[instrument(skip(self, files, folder), fields(folder_id = %folder.id, count = files.len()))]
    pub async fn upload(
        &self,
        folder: &folder::Model,
        files: Vec<UploadedFile>,
        description: Option<String>,
    ) -> Result<Vec<document::Model>, ServiceError> {
        if files.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one file is required".to_string(),
            ));
        }

        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let today = today();
        let mut stored = Vec::with_capacity(files.len());

        for upload in files {
            let key = self
                .storage
                .save(UploadArea::PropertyDocuments, today, &upload.file_name, upload.bytes)
                .await?;

            // property_id is filled in from the folder on insert
            let doc = document::ActiveModel {
                id: Set(Uuid::new_v4()),
                property_id: NotSet,
                folder_id: Set(Some(folder.id)),
                file: Set(key),
                original_name: Set(upload.file_name),
                description: Set(description.clone()),
                ..Default::default()
            }
            .insert(&*self.db_pool)
            .await?;

            counter!("pynnacle_documents.uploaded", 1);
            stored.push(doc);
        }

        info!(uploaded = stored.len(), "documents uploaded");
        Ok(stored)
    }

    /// Deletes a document and its stored file.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<NavigationTarget, ServiceError> {
        let db = &*self.db_pool;
        let doc = document::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Document {} not found", id)))?;

        let mut target = NavigationTarget {
            property_id: doc.property_id,
            tab: DocumentTab::DEFAULT.slug().to_string(),
            folder_id: None,
        };

        if let Some(folder_id) = doc.folder_id {
            if let Some(folder) = folder::Entity::find_by_id(folder_id).one(db).await? {
                let root = folder.root_folder(db).await?;
                if let Some(tab) = DocumentTab::from_folder_name(&root.name) {
                    target.tab = tab.slug().to_string();
                }
                if !folder.is_root() {
                    target.folder_id = Some(folder.id);
                }
            }
        }

        remove_stored_file(self.storage.as_ref(), &self.logger, &doc.file).await?;
        document::Entity::delete_by_id(doc.id).exec(db).await?;
        counter!("pynnacle_documents.deleted", 1);

        Ok(target)
    }
}
