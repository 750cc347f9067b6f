use crate::{
    handlers::properties::FolderSummary,
    services::{folders::FolderInfo, NavigationTarget},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn folder_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_folder).delete(delete_folder))
}

pub fn document_routes() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_document))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FolderDetail {
    pub folder: FolderSummary,
    /// Names from the section root down to this folder
    pub path_names: Vec<String>,
    #[schema(example = "Gas Certificate / 2024 / Boiler")]
    pub full_path: String,
    /// Documents in this folder and every folder beneath it
    pub document_count: u64,
    /// Section slug, when the root is a known section
    pub section: Option<String>,
    pub subfolders: Vec<FolderSummary>,
}

impl From<FolderInfo> for FolderDetail {
    fn from(info: FolderInfo) -> Self {
        Self {
            folder: info.folder.into(),
            path_names: info.path_names,
            full_path: info.full_path,
            document_count: info.document_count,
            section: info.tab.map(|tab| tab.slug().to_string()),
            subfolders: info.subfolders.into_iter().map(Into::into).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/folders/{id}",
    params(("id" = Uuid, Path, description = "Folder ID")),
    responses(
        (status = 200, description = "Folder with path and counts", body = ApiResponse<FolderDetail>),
        (status = 404, description = "Folder not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "folders"
)]
pub async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<FolderDetail> {
    let info = state.services.folders.info(id).await?;
    Ok(Json(ApiResponse::success(info.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/folders/{id}",
    params(("id" = Uuid, Path, description = "Folder ID")),
    responses(
        (status = 200, description = "Folder, sub-folders and documents deleted; data is where to navigate next", body = ApiResponse<NavigationTarget>),
        (status = 404, description = "Folder not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "folders"
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<NavigationTarget> {
    let name = state.services.folders.get(id).await?.name;
    let target = state.services.folders.delete_cascade(id).await?;
    let message = format!(
        "Folder \"{}\" and all its contents deleted successfully!",
        name
    );
    Ok(Json(ApiResponse::success(target).with_message(message)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/documents/{id}",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted; data is where to navigate next", body = ApiResponse<NavigationTarget>),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<NavigationTarget> {
    let target = state.services.documents.delete(id).await?;
    Ok(Json(
        ApiResponse::success(target).with_message("File deleted successfully."),
    ))
}
