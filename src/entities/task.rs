use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Staff member a maintenance job is allocated to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum JobAllocated {
    #[sea_orm(string_value = "Waleed")]
    Waleed,
    #[sea_orm(string_value = "Nadeem")]
    Nadeem,
    #[sea_orm(string_value = "Ruth")]
    Ruth,
    #[sea_orm(string_value = "Sheraz")]
    Sheraz,
    #[sea_orm(string_value = "Other")]
    Other,
}

/// A maintenance job raised against a property.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub job_id: String,
    #[sea_orm(indexed)]
    pub property_id: Uuid,
    #[sea_orm(nullable, indexed)]
    pub tenant_id: Option<Uuid>,
    pub date_issue_reported: NaiveDate,
    #[sea_orm(column_type = "Text")]
    pub description_of_issue: String,
    pub job_allocated: Option<JobAllocated>,
    pub date_completed: Option<NaiveDate>,
}

impl Model {
    pub fn is_pending(&self) -> bool {
        self.date_completed.is_none()
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
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "SetNull"
    )]
    Tenant,

    #[sea_orm(has_many = "super::task_image::Entity")]
    Images,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::task_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
