use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stage of the job a photo documents.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TaskImageType {
    #[sea_orm(string_value = "pre-inspection")]
    #[serde(rename = "pre-inspection")]
    #[strum(serialize = "pre-inspection")]
    PreInspection,
    #[sea_orm(string_value = "dominic")]
    #[serde(rename = "dominic")]
    #[strum(serialize = "dominic")]
    Dominic,
    #[sea_orm(string_value = "confirmation")]
    #[serde(rename = "confirmation")]
    #[strum(serialize = "confirmation")]
    Confirmation,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub task_id: Uuid,
    pub image: String,
    pub image_type: TaskImageType,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::task::Entity",
        from = "Column::TaskId",
        to = "super::task::Column::Id",
        on_delete = "Cascade"
    )]
    Task,
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
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
            active_model.uploaded_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
