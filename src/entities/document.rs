use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded property document. `file` is the storage key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub property_id: Uuid,
    #[sea_orm(nullable, indexed)]
    pub folder_id: Option<Uuid>,
    pub file: String,
    pub original_name: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Model {
    /// Final path segment of the storage key
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,

    #[sea_orm(
        belongs_to = "super::folder::Entity",
        from = "Column::FolderId",
        to = "super::folder::Column::Id",
        on_delete = "SetNull"
    )]
    Folder,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folder.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// A document filed into a folder inherits the folder's property when none was given.
    async fn before_save<C>(self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if active_model.property_id.is_not_set() {
            let folder_id = match &active_model.folder_id {
                ActiveValue::Set(Some(id)) | ActiveValue::Unchanged(Some(id)) => Some(*id),
                _ => None,
            };
            if let Some(folder_id) = folder_id {
                let folder = super::folder::Entity::find_by_id(folder_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        DbErr::RecordNotFound(format!("folder {} not found", folder_id))
                    })?;
                active_model.property_id = Set(folder.property_id);
            }
        }

        if insert {
            active_model.uploaded_at = Set(Utc::now());
        }

        Ok(active_model)
    }
}
