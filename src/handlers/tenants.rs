use crate::{
    entities::{
        tenant::{self, OccupancyStatus},
        tenant_image::{self, ImageCategory},
    },
    errors::ServiceError,
    handlers::common::{Deleted, DeletedChild, MultipartForm, SearchQuery},
    services::{tenants::TenantInput, today},
    storage::FileStorage,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tenants).post(create_tenant))
        .route(
            "/:id",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
        .route("/:id/images", post(upload_tenant_image))
}

pub fn tenant_image_routes() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_tenant_image))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
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

impl From<tenant::Model> for TenantSummary {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name(),
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            email: model.email,
            address: model.address,
            city: model.city,
            county: model.county,
            postcode: model.postcode,
            next_of_kin: model.next_of_kin,
            move_in_date: model.move_in_date,
            key_collection: model.key_collection,
            move_out_date: model.move_out_date,
            key_drop_off: model.key_drop_off,
            current_residence: model.current_residence,
            occupancy_status: model.occupancy_status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantImageSummary {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub image: String,
    pub url: String,
    pub category: ImageCategory,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl TenantImageSummary {
    fn new(model: tenant_image::Model, storage: &dyn FileStorage) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            url: storage.url(&model.image),
            image: model.image,
            category: model.category,
            description: model.description,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantPropertyLink {
    pub tenancy_id: Uuid,
    pub property_id: Uuid,
    pub property_name: Option<String>,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub is_current: bool,
}

/// Tenant record page.
#[derive(Debug, Serialize, ToSchema)]
pub struct TenantRecord {
    pub tenant: TenantSummary,
    pub images: Vec<TenantImageSummary>,
    pub tenancies: Vec<TenantPropertyLink>,
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    params(SearchQuery),
    responses(
        (status = 200, description = "Tenants ordered by surname", body = ApiResponse<Vec<TenantSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<TenantSummary>> {
    let tenants = state.services.tenants.list(query.q.as_deref()).await?;
    Ok(Json(ApiResponse::success(
        tenants.into_iter().map(TenantSummary::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant with photos and tenancies", body = ApiResponse<TenantRecord>),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TenantRecord> {
    let detail = state.services.tenants.detail(id).await?;
    let today = today();
    let storage = state.storage.as_ref();

    Ok(Json(ApiResponse::success(TenantRecord {
        tenant: detail.tenant.into(),
        images: detail
            .images
            .into_iter()
            .map(|image| TenantImageSummary::new(image, storage))
            .collect(),
        tenancies: detail
            .tenancies
            .into_iter()
            .map(|(tenancy, property)| TenantPropertyLink {
                tenancy_id: tenancy.id,
                property_id: tenancy.property_id,
                property_name: property.map(|p| p.name),
                is_current: tenancy.is_current_tenant(today),
                move_in_date: tenancy.move_in_date,
                move_out_date: tenancy.move_out_date,
            })
            .collect(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = TenantInput,
    responses(
        (status = 200, description = "Tenant created", body = ApiResponse<TenantSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(payload): Json<TenantInput>,
) -> ApiResult<TenantSummary> {
    let created = state.services.tenants.create(payload).await?;
    Ok(Json(
        ApiResponse::success(TenantSummary::from(created))
            .with_message("Tenant added successfully!"),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body = TenantInput,
    responses(
        (status = 200, description = "Tenant updated", body = ApiResponse<TenantSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn update_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TenantInput>,
) -> ApiResult<TenantSummary> {
    let updated = state.services.tenants.update(id, payload).await?;
    Ok(Json(
        ApiResponse::success(TenantSummary::from(updated))
            .with_message("Tenant details updated successfully!"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{id}",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant and photos deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let deleted = state.services.tenants.delete(id).await?;
    Ok(Json(
        ApiResponse::success(Deleted { id: deleted.id })
            .with_message("Tenant deleted successfully."),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/tenants/{id}/images",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    request_body(content_type = "multipart/form-data", description = "`image` file part, `category` (move_in, move_out, id_photo, other) and optional `description`"),
    responses(
        (status = 200, description = "Photo stored", body = ApiResponse<TenantImageSummary>),
        (status = 400, description = "Missing or non-image file", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tenant not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn upload_tenant_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<TenantImageSummary> {
    let form = MultipartForm::read(multipart).await?;
    let raw_category = form.required_text("category")?;
    let category = ImageCategory::from_str(&raw_category).map_err(|_| {
        ServiceError::ValidationError(format!("'{}' is not an image category", raw_category))
    })?;
    let description = form.text("description");

    let image = state
        .services
        .tenants
        .add_image(id, category, description, form.single_file()?)
        .await?;
    Ok(Json(
        ApiResponse::success(TenantImageSummary::new(image, state.storage.as_ref()))
            .with_message("Image uploaded successfully!"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tenant-images/{id}",
    params(("id" = Uuid, Path, description = "Tenant image ID")),
    responses(
        (status = 200, description = "Photo deleted", body = ApiResponse<DeletedChild>),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn delete_tenant_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedChild> {
    let tenant_id = state.services.tenants.delete_image(id).await?;
    Ok(Json(
        ApiResponse::success(DeletedChild {
            id,
            parent_id: tenant_id,
        })
        .with_message("Tenant image deleted successfully."),
    ))
}
