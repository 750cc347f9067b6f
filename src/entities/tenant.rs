use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OccupancyStatus {
    #[default]
    #[sea_orm(string_value = "Vacant")]
    Vacant,
    #[sea_orm(string_value = "Occupied")]
    Occupied,
    #[sea_orm(string_value = "Previous")]
    Previous,
}

/// A tenant record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub postcode: String,
    pub next_of_kin: Option<String>,
    pub move_in_date: NaiveDate,
    pub key_collection: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub key_drop_off: Option<NaiveDate>,
    pub current_residence: String,
    pub occupancy_status: OccupancyStatus,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tenant_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::tenancy::Entity")]
    Tenancies,
    #[sea_orm(has_many = "super::task::Entity")]
    Tasks,
}

impl Related<super::tenant_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::tenancy::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenancies.def()
    }
}

impl Related<super::task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
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
