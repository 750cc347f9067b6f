use crate::{
    db::{icontains, DbPool},
    entities::{
        property, tenancy,
        tenant::{self, OccupancyStatus},
        tenant_image::{self, ImageCategory},
    },
    errors::ServiceError,
    services::{
        not_blank, remove_stored_file, today, LookupOption, LookupPage, UploadedFile, LOOKUP_LIMIT,
    },
    storage::{is_image_file_name, FileStorage, UploadArea},
};
use chrono::NaiveDate;
use metrics::counter;
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn unknown_residence() -> String {
    "Unknown".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TenantInput {
    #[validate(length(min = 1, max = 50), custom = "not_blank")]
    pub first_name: String,
    #[validate(length(min = 1, max = 50), custom = "not_blank")]
    pub last_name: String,
    #[validate(length(min = 1, max = 15), custom = "not_blank")]
    pub phone: String,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub email: String,
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub city: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub county: String,
    #[validate(length(min = 1, max = 10), custom = "not_blank")]
    pub postcode: String,
    #[validate(length(max = 50))]
    pub next_of_kin: Option<String>,
    /// Defaults to today
    pub move_in_date: Option<NaiveDate>,
    /// Defaults to today
    pub key_collection: Option<NaiveDate>,
    pub move_out_date: Option<NaiveDate>,
    pub key_drop_off: Option<NaiveDate>,
    #[serde(default = "unknown_residence")]
    #[validate(length(max = 255))]
    pub current_residence: String,
    #[serde(default)]
    pub occupancy_status: OccupancyStatus,
}

impl TenantInput {
    fn apply(self, model: &mut tenant::ActiveModel) {
        let today = today();
        model.first_name = Set(self.first_name.trim().to_string());
        model.last_name = Set(self.last_name.trim().to_string());
        model.phone = Set(self.phone.trim().to_string());
        model.email = Set(self.email.trim().to_string());
        model.address = Set(self.address.trim().to_string());
        model.city = Set(self.city);
        model.county = Set(self.county);
        model.postcode = Set(self.postcode.trim().to_string());
        model.next_of_kin = Set(self.next_of_kin);
        model.move_in_date = Set(self.move_in_date.unwrap_or(today));
        model.key_collection = Set(self.key_collection.unwrap_or(today));
        model.move_out_date = Set(self.move_out_date);
        model.key_drop_off = Set(self.key_drop_off);
        model.current_residence = Set(self.current_residence);
        model.occupancy_status = Set(self.occupancy_status);
    }
}

/// A tenant with everything the record page lists.
#[derive(Debug, Clone)]
pub struct TenantDetail {
    pub tenant: tenant::Model,
    pub images: Vec<tenant_image::Model>,
    pub tenancies: Vec<(tenancy::Model, Option<property::Model>)>,
}

/// Service for tenant records and their photos
#[derive(Clone)]
pub struct TenantService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn FileStorage>,
    logger: Logger,
}

impl TenantService {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, logger: Logger) -> Self {
        Self {
            db_pool,
            storage,
            logger,
        }
    }

    /// Tenants ordered by surname, optionally filtered by name or email.
    #[instrument(skip(self))]
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<tenant::Model>, ServiceError> {
        let mut query = tenant::Entity::find();
        if let Some(needle) = search.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(icontains(tenant::Column::FirstName, needle))
                    .add(icontains(tenant::Column::LastName, needle))
                    .add(icontains(tenant::Column::Email, needle)),
            );
        }

        Ok(query
            .order_by_asc(tenant::Column::LastName)
            .order_by_asc(tenant::Column::FirstName)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<tenant::Model, ServiceError> {
        tenant::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tenant {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> Result<TenantDetail, ServiceError> {
        let db = &*self.db_pool;
        let tenant = self.get(id).await?;
        let images = tenant
            .find_related(tenant_image::Entity)
            .order_by_asc(tenant_image::Column::UploadedAt)
            .all(db)
            .await?;
        let tenancies = tenancy::Entity::find()
            .filter(tenancy::Column::TenantId.eq(id))
            .order_by_desc(tenancy::Column::MoveInDate)
            .find_also_related(property::Entity)
            .all(db)
            .await?;

        Ok(TenantDetail {
            tenant,
            images,
            tenancies,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: TenantInput) -> Result<tenant::Model, ServiceError> {
        input.validate()?;
        let mut model = tenant::ActiveModel {
            id: Set(Uuid::new_v4()),
            ..Default::default()
        };
        input.apply(&mut model);

        let created = model.insert(&*self.db_pool).await?;
        info!(tenant_id = %created.id, "tenant created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: TenantInput) -> Result<tenant::Model, ServiceError> {
        input.validate()?;
        let mut model: tenant::ActiveModel = self.get(id).await?.into();
        input.apply(&mut model);
        Ok(model.update(&*self.db_pool).await?)
    }

    /// Deletes a tenant after removing its stored photos.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<tenant::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;
        let images = existing.find_related(tenant_image::Entity).all(db).await?;

        for image in &images {
            remove_stored_file(self.storage.as_ref(), &self.logger, &image.image).await?;
        }

        tenant::Entity::delete_by_id(id).exec(db).await?;
        slog::info!(self.logger, "tenant deleted"; "tenant_id" => %id, "images" => images.len());
        Ok(existing)
    }

    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn add_image(
        &self,
        tenant_id: Uuid,
        category: ImageCategory,
        description: Option<String>,
        upload: UploadedFile,
    ) -> Result<tenant_image::Model, ServiceError> {
        if !is_image_file_name(&upload.file_name) {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not an accepted image file",
                upload.file_name
            )));
        }
        if description.as_ref().map_or(false, |d| d.chars().count() > 255) {
            return Err(ServiceError::ValidationError(
                "Description must be at most 255 characters".to_string(),
            ));
        }
        let tenant = self.get(tenant_id).await?;

        let key = self
            .storage
            .save(UploadArea::TenantImages, today(), &upload.file_name, upload.bytes)
            .await?;

        let image = tenant_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.id),
            image: Set(key),
            category: Set(category),
            description: Set(description.filter(|d| !d.trim().is_empty())),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        counter!("pynnacle_tenant_images.uploaded", 1);
        Ok(image)
    }

    /// Deletes a tenant photo and its file. Returns the owning tenant id.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;
        let image = tenant_image::Entity::find_by_id(image_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tenant image {} not found", image_id)))?;

        remove_stored_file(self.storage.as_ref(), &self.logger, &image.image).await?;
        tenant_image::Entity::delete_by_id(image.id).exec(db).await?;
        Ok(image.tenant_id)
    }

    /// select2 lookup by first or last name, `LOOKUP_LIMIT` per page.
    pub async fn autocomplete(
        &self,
        term: Option<&str>,
        page: Option<u64>,
    ) -> Result<LookupPage, ServiceError> {
        // id breaks name ties so pages never overlap
        let mut query = tenant::Entity::find()
            .order_by_asc(tenant::Column::LastName)
            .order_by_asc(tenant::Column::FirstName)
            .order_by_asc(tenant::Column::Id);
        if let Some(needle) = term.map(str::trim).filter(|q| !q.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(icontains(tenant::Column::FirstName, needle))
                    .add(icontains(tenant::Column::LastName, needle)),
            );
        }

        let rows = query
            .offset(LookupPage::offset(page))
            .limit(LOOKUP_LIMIT + 1)
            .all(&*self.db_pool)
            .await?;
        Ok(LookupPage::from_rows(
            rows.into_iter()
                .map(|t| LookupOption {
                    id: t.id,
                    text: t.full_name(),
                })
                .collect(),
        ))
    }
}
