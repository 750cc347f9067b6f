use crate::{
    db::DbPool,
    entities::{document, folder},
    errors::ServiceError,
    services::{remove_stored_file, sections::DocumentTab, NavigationTarget},
    storage::FileStorage,
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use slog::Logger;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DUPLICATE_FOLDER_MESSAGE: &str = "A folder with this name already exists in this location.";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateFolderInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Folder to create under; the section root when omitted
    pub parent_id: Option<Uuid>,
}

/// A folder with the derived values the folder page shows.
#[derive(Debug, Clone)]
pub struct FolderInfo {
    pub folder: folder::Model,
    pub path_names: Vec<String>,
    pub full_path: String,
    pub document_count: u64,
    pub tab: Option<DocumentTab>,
    pub subfolders: Vec<folder::Model>,
}

/// Service for the per-property folder tree
#[derive(Clone)]
pub struct FolderService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn FileStorage>,
    logger: Logger,
}

impl FolderService {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, logger: Logger) -> Self {
        Self {
            db_pool,
            storage,
            logger,
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<folder::Model, ServiceError> {
        folder::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Folder {} not found", id)))
    }

    /// Root folder of `tab` on a property, created when missing.
    #[instrument(skip(self))]
    pub async fn ensure_tab_root(
        &self,
        property_id: Uuid,
        tab: DocumentTab,
    ) -> Result<folder::Model, ServiceError> {
        let db = &*self.db_pool;
        if let Some(existing) = find_root(db, property_id, tab.folder_name()).await? {
            return Ok(existing);
        }

        let root = folder::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(tab.folder_name().to_string()),
            property_id: Set(property_id),
            parent_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        counter!("pynnacle_folders.roots_created", 1);
        info!(property_id = %property_id, tab = tab.slug(), "created section root folder");
        Ok(root)
    }

    /// Creates a folder inside a document section.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_in_tab(
        &self,
        property_id: Uuid,
        tab: DocumentTab,
        input: CreateFolderInput,
    ) -> Result<folder::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Folder name cannot be blank".to_string(),
            ));
        }

        let section_root = self.ensure_tab_root(property_id, tab).await?;
        let parent = match input.parent_id {
            None => section_root,
            Some(parent_id) => {
                let parent = folder::Entity::find_by_id(parent_id)
                    .filter(folder::Column::PropertyId.eq(property_id))
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Folder {} not found", parent_id))
                    })?;
                if parent.root_folder(db).await?.id != section_root.id {
                    return Err(ServiceError::BadRequest(
                        "Parent folder belongs to a different section".to_string(),
                    ));
                }
                parent
            }
        };

        let duplicates = folder::Entity::find()
            .filter(folder::Column::PropertyId.eq(property_id))
            .filter(folder::Column::ParentId.eq(parent.id))
            .filter(folder::Column::Name.eq(name.as_str()))
            .count(db)
            .await?;
        if duplicates > 0 {
            return Err(ServiceError::Conflict(DUPLICATE_FOLDER_MESSAGE.to_string()));
        }

        let created = folder::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            property_id: Set(property_id),
            parent_id: Set(Some(parent.id)),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_FOLDER_MESSAGE))?;

        info!(folder_id = %created.id, parent_id = %parent.id, "folder created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn info(&self, id: Uuid) -> Result<FolderInfo, ServiceError> {
        let db = &*self.db_pool;
        let folder = self.get(id).await?;
        let ancestry = folder.ancestry(db).await?;
        let path_names: Vec<String> = ancestry.iter().map(|f| f.name.clone()).collect();
        let tab = ancestry
            .first()
            .and_then(|root| DocumentTab::from_folder_name(&root.name));

        Ok(FolderInfo {
            full_path: path_names.join(folder::PATH_SEPARATOR),
            path_names,
            document_count: folder.document_count(db).await?,
            subfolders: folder.children(db).await?,
            tab,
            folder,
        })
    }

    /// Deletes a folder, every folder beneath it and all their documents.
    ///
    /// Returns the view to show afterwards: the deleted folder's parent, or the
    /// section root when the parent is the root.
    #[instrument(skip(self))]
    pub async fn delete_cascade(&self, id: Uuid) -> Result<NavigationTarget, ServiceError> {
        let db = &*self.db_pool;
        let target = self.get(id).await?;
        let ancestry = target.ancestry(db).await?;

        let tab = ancestry
            .first()
            .and_then(|root| DocumentTab::from_folder_name(&root.name))
            .unwrap_or(DocumentTab::DEFAULT);
        let redirect_folder = match ancestry.len() {
            // [.., grandparent, parent, target]: only a non-root parent is worth opening
            n if n >= 3 => Some(ancestry[n - 2].id),
            _ => None,
        };

        let mut queue = VecDeque::from([target.clone()]);
        let mut doomed_folders = Vec::new();
        let mut doomed_documents = Vec::new();
        while let Some(current) = queue.pop_front() {
            doomed_documents.extend(current.find_related(document::Entity).all(db).await?);
            queue.extend(current.children(db).await?);
            doomed_folders.push(current);
        }

        for doc in &doomed_documents {
            remove_stored_file(self.storage.as_ref(), &self.logger, &doc.file).await?;
            document::Entity::delete_by_id(doc.id).exec(db).await?;
        }

        // Breadth-first order reversed puts every child before its parent.
        for doomed in doomed_folders.iter().rev() {
            folder::Entity::delete_by_id(doomed.id).exec(db).await?;
        }

        counter!("pynnacle_folders.deleted", doomed_folders.len() as u64);
        slog::info!(self.logger, "folder tree deleted";
            "folder_id" => %id,
            "folders" => doomed_folders.len(),
            "documents" => doomed_documents.len());

        Ok(NavigationTarget {
            property_id: target.property_id,
            tab: tab.slug().to_string(),
            folder_id: redirect_folder,
        })
    }
}

async fn find_root(
    db: &DbPool,
    property_id: Uuid,
    name: &str,
) -> Result<Option<folder::Model>, ServiceError> {
    Ok(folder::Entity::find()
        .filter(folder::Column::PropertyId.eq(property_id))
        .filter(folder::Column::ParentId.is_null())
        .filter(folder::Column::Name.eq(name))
        .order_by_asc(folder::Column::CreatedAt)
        .one(db)
        .await?)
}
