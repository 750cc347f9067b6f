use crate::{
    db::DbPool,
    entities::{property, tenancy, tenant},
    errors::ServiceError,
    services::sections::TenancyEntry,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DUPLICATE_TENANCY_MESSAGE: &str =
    "This tenant is already recorded at this property with that move-in date.";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_tenancy_dates"))]
pub struct TenancyInput {
    pub tenant_id: Uuid,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
}

fn validate_tenancy_dates(input: &TenancyInput) -> Result<(), ValidationError> {
    match input.move_out_date {
        Some(move_out) if move_out < input.move_in_date => {
            let mut err = ValidationError::new("move_out_before_move_in");
            err.message = Some("Move-out date cannot be before the move-in date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// A property's tenancies split by status, each newest move-in first.
#[derive(Debug, Clone, Default)]
pub struct TenancyLedger {
    pub current: Vec<TenancyEntry>,
    pub past: Vec<TenancyEntry>,
}

/// Partitions tenancies (already ordered) into current and past as of `today`.
pub fn partition_tenancies(entries: Vec<TenancyEntry>, today: NaiveDate) -> TenancyLedger {
    let (current, past) = entries
        .into_iter()
        .partition(|entry| entry.tenancy.is_current_tenant(today));
    TenancyLedger { current, past }
}

#[derive(Clone)]
pub struct TenancyService {
    db_pool: Arc<DbPool>,
}

impl TenancyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn for_property(
        &self,
        property_id: Uuid,
        today: NaiveDate,
    ) -> Result<TenancyLedger, ServiceError> {
        let rows = tenancy::Entity::find()
            .filter(tenancy::Column::PropertyId.eq(property_id))
            .order_by_desc(tenancy::Column::MoveInDate)
            .find_also_related(tenant::Entity)
            .all(&*self.db_pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(|(tenancy, tenant)| TenancyEntry { tenancy, tenant })
            .collect();
        Ok(partition_tenancies(entries, today))
    }

    /// Records a tenant at a property. Returns the row and the tenant's full name.
    #[instrument(skip(self, input))]
    pub async fn add(
        &self,
        property_id: Uuid,
        input: TenancyInput,
    ) -> Result<(tenancy::Model, String), ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        property::Entity::find_by_id(property_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Property {} not found", property_id)))?;
        let tenant = tenant::Entity::find_by_id(input.tenant_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Tenant {} not found", input.tenant_id))
            })?;

        let created = tenancy::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.id),
            property_id: Set(property_id),
            move_in_date: Set(input.move_in_date),
            move_out_date: Set(input.move_out_date),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_TENANCY_MESSAGE))?;

        info!(tenancy_id = %created.id, "tenancy recorded");
        Ok((created, tenant.full_name()))
    }

    /// Removes a tenancy of this property. Returns the tenant's full name.
    #[instrument(skip(self))]
    pub async fn remove(&self, property_id: Uuid, tenancy_id: Uuid) -> Result<String, ServiceError> {
        let db = &*self.db_pool;
        let (row, tenant) = tenancy::Entity::find_by_id(tenancy_id)
            .filter(tenancy::Column::PropertyId.eq(property_id))
            .find_also_related(tenant::Entity)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Tenancy {} not found for property {}",
                    tenancy_id, property_id
                ))
            })?;

        tenancy::Entity::delete_by_id(row.id).exec(db).await?;
        Ok(tenant.map(|t| t.full_name()).unwrap_or_default())
    }
}
