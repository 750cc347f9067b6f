//! Per-property folder tree.
//!
//! A folder with no parent is the root of one document tab. `(name,
//! property_id, parent_id)` is unique; root folders are checked in the
//! service layer because SQL treats NULL parents as distinct.

use async_recursion::async_recursion;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Separator placed between folder names by [`Model::full_path`]
pub const PATH_SEPARATOR: &str = " / ";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(indexed)]
    pub property_id: Uuid,
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
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
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,

    #[sea_orm(has_many = "super::document::Entity")]
    Documents,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

impl Model {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Direct child folders ordered by name
    pub async fn children(&self, db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ParentId.eq(self.id))
            .order_by_asc(Column::Name)
            .all(db)
            .await
    }

    /// Documents in this folder plus every folder beneath it.
    #[async_recursion]
    pub async fn document_count(&self, db: &DatabaseConnection) -> Result<u64, DbErr> {
        let mut count = super::document::Entity::find()
            .filter(super::document::Column::FolderId.eq(self.id))
            .count(db)
            .await?;

        for child in self.children(db).await? {
            count += child.document_count(db).await?;
        }

        Ok(count)
    }

    /// Ancestors from the root down to and including this folder.
    pub async fn ancestry(&self, db: &DatabaseConnection) -> Result<Vec<Model>, DbErr> {
        let mut chain = vec![self.clone()];
        let mut seen = HashSet::from([self.id]);
        let mut next_parent = self.parent_id;

        while let Some(parent_id) = next_parent {
            if !seen.insert(parent_id) {
                return Err(DbErr::Custom(format!(
                    "folder {} has a cyclic parent chain",
                    self.id
                )));
            }
            let parent = Entity::find_by_id(parent_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    DbErr::RecordNotFound(format!("parent folder {} not found", parent_id))
                })?;
            next_parent = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// The tab-level folder this folder lives under (itself when it has no parent).
    pub async fn root_folder(&self, db: &DatabaseConnection) -> Result<Model, DbErr> {
        if self.is_root() {
            return Ok(self.clone());
        }
        let mut chain = self.ancestry(db).await?;
        Ok(chain.swap_remove(0))
    }

    /// Folder names from the root down to this folder.
    pub async fn path_names(&self, db: &DatabaseConnection) -> Result<Vec<String>, DbErr> {
        Ok(self
            .ancestry(db)
            .await?
            .into_iter()
            .map(|folder| folder.name)
            .collect())
    }

    /// Display path such as `Pictures / 2024 / Kitchen`
    pub async fn full_path(&self, db: &DatabaseConnection) -> Result<String, DbErr> {
        Ok(self.path_names(db).await?.join(PATH_SEPARATOR))
    }
}
