use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant's occupation of a property over a date range.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenant_property_relationships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub tenant_id: Uuid,
    #[sea_orm(indexed)]
    pub property_id: Uuid,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
}

/// A tenancy is current until the day after its move-out date.
pub fn is_current(move_out_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    match move_out_date {
        None => true,
        Some(date) => date >= today,
    }
}

impl Model {
    pub fn is_current_tenant(&self, today: NaiveDate) -> bool {
        is_current(self.move_out_date, today)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id",
        on_delete = "Cascade"
    )]
    Tenant,

    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_ended_tenancy_is_current() {
        assert!(is_current(None, date(2024, 5, 1)));
    }

    #[test]
    fn moving_out_today_is_still_current() {
        assert!(is_current(Some(date(2024, 5, 1)), date(2024, 5, 1)));
    }

    #[test]
    fn moved_out_yesterday_is_past() {
        assert!(!is_current(Some(date(2024, 4, 30)), date(2024, 5, 1)));
    }
}
