use crate::{
    entities::{document, folder, property},
    errors::ServiceError,
    handlers::common::{Deleted, FolderQuery, MultipartForm},
    services::{
        folders::CreateFolderInput,
        properties::{PropertyInput, PropertySort},
        sections::{DocumentTab, SectionView, TenancyEntry},
        tenancies::TenancyInput,
        today,
    },
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
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_properties).post(create_property))
        .route(
            "/:id",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/:id/sections/:tab", get(property_section))
        .route("/:id/sections/:tab/documents", post(upload_documents))
        .route("/:id/sections/:tab/folders", post(create_folder))
        .route("/:id/tenancies", post(add_tenancy))
        .route("/:id/tenancies/:tenancy_id", delete(remove_tenancy))
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyListQuery {
    /// Matches name or address
    pub q: Option<String>,
    /// e.g. `name_asc`, `overall_soonest`, `gas_furthest`
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertySummary {
    pub id: Uuid,
    #[schema(example = "Oak House")]
    pub name: String,
    pub address: String,
    pub postcode: String,
    pub city: Option<String>,
    pub county: Option<String>,
    pub property_type: property::PropertyType,
    /// Display label, e.g. "2 Bedroom"
    pub property_type_label: String,
    pub number_of_units: i32,
    pub purchase_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "185000.00")]
    pub purchase_price: Option<Decimal>,
    pub building_insurance_expiry_date: Option<NaiveDate>,
    pub gas_certificate_expiry_date: Option<NaiveDate>,
    pub electric_certificate_expiry_date: Option<NaiveDate>,
    pub epc_certificate_expiry_date: Option<NaiveDate>,
    pub fra_certificate_expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<property::Model> for PropertySummary {
    fn from(model: property::Model) -> Self {
        Self {
            id: model.id,
            property_type_label: model.property_type.label().to_string(),
            name: model.name,
            address: model.address,
            postcode: model.postcode,
            city: model.city,
            county: model.county,
            property_type: model.property_type,
            number_of_units: model.number_of_units,
            purchase_date: model.purchase_date,
            purchase_price: model.purchase_price,
            building_insurance_expiry_date: model.building_insurance_expiry_date,
            gas_certificate_expiry_date: model.gas_certificate_expiry_date,
            electric_certificate_expiry_date: model.electric_certificate_expiry_date,
            epc_certificate_expiry_date: model.epc_certificate_expiry_date,
            fra_certificate_expiry_date: model.fra_certificate_expiry_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyList {
    pub items: Vec<PropertySummary>,
    /// Sort key actually applied
    pub current_sort: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FolderSummary {
    pub id: Uuid,
    pub name: String,
    pub property_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<folder::Model> for FolderSummary {
    fn from(model: folder::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            property_id: model.property_id,
            parent_id: model.parent_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub property_id: Uuid,
    pub folder_id: Option<Uuid>,
    /// Storage key
    #[schema(example = "property_documents/2024/03/10/gas-safety.pdf")]
    pub file: String,
    pub file_name: String,
    pub original_name: String,
    pub url: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentSummary {
    pub fn new(model: document::Model, storage: &dyn FileStorage) -> Self {
        Self {
            id: model.id,
            property_id: model.property_id,
            folder_id: model.folder_id,
            file_name: model.file_name().to_string(),
            url: storage.url(&model.file),
            file: model.file,
            original_name: model.original_name,
            description: model.description,
            uploaded_at: model.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TabSummary {
    #[schema(example = "gas-certificate")]
    pub slug: String,
    #[schema(example = "Gas Certificate")]
    pub name: String,
    pub root_folder_id: Uuid,
    /// Documents anywhere under the tab
    pub document_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenancySummary {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_name: Option<String>,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
}

impl From<TenancyEntry> for TenancySummary {
    fn from(entry: TenancyEntry) -> Self {
        Self {
            id: entry.tenancy.id,
            tenant_id: entry.tenancy.tenant_id,
            tenant_name: entry.tenant.map(|t| t.full_name()),
            move_in_date: entry.tenancy.move_in_date,
            move_out_date: entry.tenancy.move_out_date,
        }
    }
}

/// Property detail view for one section.
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertySectionResponse {
    pub property: PropertySummary,
    #[schema(example = "building-insurance")]
    pub active_section: String,
    pub tabs: Vec<TabSummary>,
    pub active_folder: Option<FolderSummary>,
    pub folder_path: Vec<String>,
    pub subfolders: Vec<FolderSummary>,
    pub documents: Vec<DocumentSummary>,
    pub current_tenants: Vec<TenancySummary>,
    pub past_tenants: Vec<TenancySummary>,
    /// Fallbacks applied to the request
    pub notices: Vec<String>,
}

impl PropertySectionResponse {
    fn new(view: SectionView, storage: &dyn FileStorage) -> Self {
        Self {
            property: view.property.into(),
            active_section: view.active_section.slug().to_string(),
            tabs: view
                .tabs
                .into_iter()
                .map(|overview| TabSummary {
                    slug: overview.tab.slug().to_string(),
                    name: overview.tab.folder_name().to_string(),
                    root_folder_id: overview.root.id,
                    document_count: overview.document_count,
                })
                .collect(),
            active_folder: view.active_folder.map(FolderSummary::from),
            folder_path: view.folder_path,
            subfolders: view.subfolders.into_iter().map(FolderSummary::from).collect(),
            documents: view
                .documents
                .into_iter()
                .map(|doc| DocumentSummary::new(doc, storage))
                .collect(),
            current_tenants: view.current_tenants.into_iter().map(Into::into).collect(),
            past_tenants: view.past_tenants.into_iter().map(Into::into).collect(),
            notices: view.notices,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedDocuments {
    pub folder_id: Uuid,
    pub documents: Vec<DocumentSummary>,
    pub notices: Vec<String>,
}

pub const NOT_A_DOCUMENT_SECTION: &str =
    "Folders cannot be added to this section. Please select a valid document section.";

/// Mutations only target document sections; no fallback tab is substituted.
fn document_tab(slug: &str) -> Result<DocumentTab, ServiceError> {
    DocumentTab::from_slug(slug)
        .ok_or_else(|| ServiceError::BadRequest(NOT_A_DOCUMENT_SECTION.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties",
    params(PropertyListQuery),
    responses(
        (status = 200, description = "Properties listed", body = ApiResponse<PropertyList>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<PropertyListQuery>,
) -> ApiResult<PropertyList> {
    let sort = PropertySort::parse(query.sort.as_deref());
    let properties = state
        .services
        .properties
        .list(query.q.as_deref(), sort)
        .await?;

    Ok(Json(ApiResponse::success(PropertyList {
        items: properties.into_iter().map(PropertySummary::from).collect(),
        current_sort: sort.key(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property fetched", body = ApiResponse<PropertySummary>),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PropertySummary> {
    let property = state.services.properties.get(id).await?;
    Ok(Json(ApiResponse::success(property.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties",
    request_body = PropertyInput,
    responses(
        (status = 200, description = "Property created", body = ApiResponse<PropertySummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn create_property(
    State(state): State<AppState>,
    Json(payload): Json<PropertyInput>,
) -> ApiResult<PropertySummary> {
    let created = state.services.properties.create(payload).await?;
    Ok(Json(
        ApiResponse::success(PropertySummary::from(created))
            .with_message("Property added successfully!"),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body = PropertyInput,
    responses(
        (status = 200, description = "Property updated", body = ApiResponse<PropertySummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PropertyInput>,
) -> ApiResult<PropertySummary> {
    let updated = state.services.properties.update(id, payload).await?;
    Ok(Json(
        ApiResponse::success(PropertySummary::from(updated))
            .with_message("Property details updated successfully!"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property and its files deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let deleted = state.services.properties.delete(id).await?;
    Ok(Json(
        ApiResponse::success(Deleted { id: deleted.id })
            .with_message("Property deleted successfully."),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}/sections/{tab}",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("tab" = String, Path, description = "Section slug, e.g. `gas-certificate` or `tenants-info`"),
        FolderQuery
    ),
    responses(
        (status = 200, description = "Property detail view", body = ApiResponse<PropertySectionResponse>),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "properties"
)]
pub async fn property_section(
    State(state): State<AppState>,
    Path((id, tab)): Path<(Uuid, String)>,
    Query(query): Query<FolderQuery>,
) -> ApiResult<PropertySectionResponse> {
    let view = state
        .services
        .sections
        .view(id, &tab, query.folder_id.as_deref(), today())
        .await?;
    Ok(Json(ApiResponse::success(PropertySectionResponse::new(
        view,
        state.storage.as_ref(),
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties/{id}/sections/{tab}/documents",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("tab" = String, Path, description = "Document section slug"),
        FolderQuery
    ),
    request_body(content_type = "multipart/form-data", description = "One or more `file` parts and an optional `description`"),
    responses(
        (status = 200, description = "Documents stored", body = ApiResponse<UploadedDocuments>),
        (status = 400, description = "No files or not a document section", body = crate::errors::ErrorResponse),
        (status = 404, description = "Property not found", body = crate::errors::ErrorResponse),
        (status = 413, description = "Upload too large", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn upload_documents(
    State(state): State<AppState>,
    Path((id, tab)): Path<(Uuid, String)>,
    Query(query): Query<FolderQuery>,
    multipart: Multipart,
) -> ApiResult<UploadedDocuments> {
    let tab = document_tab(&tab)?;
    state.services.properties.get(id).await?;
    let form = MultipartForm::read(multipart).await?;

    let (folder, notice) = state
        .services
        .sections
        .upload_folder(id, tab, query.folder_id.as_deref())
        .await?;
    let description = form.text("description");
    let documents = state
        .services
        .documents
        .upload(&folder, form.files, description)
        .await?;

    let message = format!("{} file(s) uploaded successfully!", documents.len());
    Ok(Json(
        ApiResponse::success(UploadedDocuments {
            folder_id: folder.id,
            documents: documents
                .into_iter()
                .map(|doc| DocumentSummary::new(doc, state.storage.as_ref()))
                .collect(),
            notices: notice.into_iter().collect(),
        })
        .with_message(message),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties/{id}/sections/{tab}/folders",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("tab" = String, Path, description = "Document section slug")
    ),
    request_body = CreateFolderInput,
    responses(
        (status = 200, description = "Folder created", body = ApiResponse<FolderSummary>),
        (status = 400, description = "Invalid name or section", body = crate::errors::ErrorResponse),
        (status = 404, description = "Property or parent not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate folder", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "folders"
)]
pub async fn create_folder(
    State(state): State<AppState>,
    Path((id, tab)): Path<(Uuid, String)>,
    Json(payload): Json<CreateFolderInput>,
) -> ApiResult<FolderSummary> {
    let tab = document_tab(&tab)?;
    state.services.properties.get(id).await?;
    let created = state.services.folders.create_in_tab(id, tab, payload).await?;

    let message = format!("Folder '{}' created successfully.", created.name);
    Ok(Json(
        ApiResponse::success(FolderSummary::from(created)).with_message(message),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties/{id}/tenancies",
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body = TenancyInput,
    responses(
        (status = 200, description = "Tenancy recorded", body = ApiResponse<TenancySummary>),
        (status = 400, description = "Invalid dates", body = crate::errors::ErrorResponse),
        (status = 404, description = "Property or tenant not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate tenancy", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenancies"
)]
pub async fn add_tenancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TenancyInput>,
) -> ApiResult<TenancySummary> {
    let (tenancy, tenant_name) = state.services.tenancies.add(id, payload).await?;
    let message = format!("Tenant relationship for {} added successfully!", tenant_name);

    Ok(Json(
        ApiResponse::success(TenancySummary {
            id: tenancy.id,
            tenant_id: tenancy.tenant_id,
            tenant_name: Some(tenant_name),
            move_in_date: tenancy.move_in_date,
            move_out_date: tenancy.move_out_date,
        })
        .with_message(message),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}/tenancies/{tenancy_id}",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        ("tenancy_id" = Uuid, Path, description = "Tenancy ID")
    ),
    responses(
        (status = 200, description = "Tenancy removed", body = ApiResponse<Deleted>),
        (status = 404, description = "Tenancy not found on this property", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tenancies"
)]
pub async fn remove_tenancy(
    State(state): State<AppState>,
    Path((id, tenancy_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Deleted> {
    let tenant_name = state.services.tenancies.remove(id, tenancy_id).await?;
    let message = format!(
        "Tenant relationship for {} deleted successfully.",
        tenant_name
    );
    Ok(Json(
        ApiResponse::success(Deleted { id: tenancy_id }).with_message(message),
    ))
}
