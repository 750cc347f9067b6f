use crate::{
    entities::{
        task::{self, JobAllocated},
        task_image::{self, TaskImageType},
    },
    errors::ServiceError,
    handlers::common::{Deleted, DeletedChild, MultipartForm},
    services::tasks::{TaskInput, TaskRow},
    storage::FileStorage,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/:id/images", post(upload_task_image))
}

pub fn task_image_routes() -> Router<AppState> {
    Router::new().route("/:id", delete(delete_task_image))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskSummary {
    pub id: Uuid,
    #[schema(example = "JOB-0042")]
    pub job_id: String,
    pub property_id: Uuid,
    pub property_name: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub date_issue_reported: NaiveDate,
    pub description_of_issue: String,
    pub job_allocated: Option<JobAllocated>,
    pub date_completed: Option<NaiveDate>,
    /// True until a completion date is recorded
    pub pending: bool,
}

impl TaskSummary {
    fn new(model: task::Model, property_name: Option<String>) -> Self {
        Self {
            id: model.id,
            pending: model.is_pending(),
            job_id: model.job_id,
            property_id: model.property_id,
            property_name,
            tenant_id: model.tenant_id,
            date_issue_reported: model.date_issue_reported,
            description_of_issue: model.description_of_issue,
            job_allocated: model.job_allocated,
            date_completed: model.date_completed,
        }
    }
}

impl From<TaskRow> for TaskSummary {
    fn from((task, property): TaskRow) -> Self {
        TaskSummary::new(task, property.map(|p| p.name))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskImageSummary {
    pub id: Uuid,
    pub task_id: Uuid,
    pub image: String,
    pub url: String,
    pub image_type: TaskImageType,
    pub uploaded_at: DateTime<Utc>,
}

impl TaskImageSummary {
    fn new(model: task_image::Model, storage: &dyn FileStorage) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            url: storage.url(&model.image),
            image: model.image,
            image_type: model.image_type,
            uploaded_at: model.uploaded_at,
        }
    }
}

/// Task page with photos grouped by job stage.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskRecord {
    pub task: TaskSummary,
    pub tenant_name: Option<String>,
    pub pre_inspection_images: Vec<TaskImageSummary>,
    pub dominic_images: Vec<TaskImageSummary>,
    pub confirmation_images: Vec<TaskImageSummary>,
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "Tasks, most recently reported first", body = ApiResponse<Vec<TaskSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<TaskSummary>> {
    let rows = state.services.tasks.list().await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TaskSummary::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task with grouped photos", body = ApiResponse<TaskRecord>),
        (status = 404, description = "Task not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TaskRecord> {
    let detail = state.services.tasks.detail(id).await?;
    let storage = state.storage.as_ref();
    let summarise = |images: Vec<task_image::Model>| -> Vec<TaskImageSummary> {
        images
            .into_iter()
            .map(|image| TaskImageSummary::new(image, storage))
            .collect()
    };

    Ok(Json(ApiResponse::success(TaskRecord {
        task: TaskSummary::new(detail.task, detail.property.map(|p| p.name)),
        tenant_name: detail.tenant.map(|t| t.full_name()),
        pre_inspection_images: summarise(detail.pre_inspection),
        dominic_images: summarise(detail.dominic),
        confirmation_images: summarise(detail.confirmation),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task created", body = ApiResponse<TaskSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Job ID already used", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskInput>,
) -> ApiResult<TaskSummary> {
    let created = state.services.tasks.create(payload).await?;
    Ok(Json(
        ApiResponse::success(TaskSummary::new(created, None))
            .with_message("Task created successfully!"),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<TaskSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Job ID already used", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskInput>,
) -> ApiResult<TaskSummary> {
    let updated = state.services.tasks.update(id, payload).await?;
    Ok(Json(
        ApiResponse::success(TaskSummary::new(updated, None))
            .with_message("Task updated successfully!"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task and photos deleted", body = ApiResponse<Deleted>),
        (status = 404, description = "Task not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn delete_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Deleted> {
    let deleted = state.services.tasks.delete(id).await?;
    Ok(Json(
        ApiResponse::success(Deleted { id: deleted.id }).with_message("Task deleted successfully."),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/images",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body(content_type = "multipart/form-data", description = "`image` file part and `image_type` (pre-inspection, dominic, confirmation)"),
    responses(
        (status = 200, description = "Photo stored", body = ApiResponse<TaskImageSummary>),
        (status = 400, description = "Missing or non-image file", body = crate::errors::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn upload_task_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<TaskImageSummary> {
    let form = MultipartForm::read(multipart).await?;
    let raw_type = form.required_text("image_type")?;
    let image_type = TaskImageType::from_str(&raw_type).map_err(|_| {
        ServiceError::ValidationError(format!("'{}' is not a task image type", raw_type))
    })?;

    let image = state
        .services
        .tasks
        .add_image(id, image_type, form.single_file()?)
        .await?;
    Ok(Json(
        ApiResponse::success(TaskImageSummary::new(image, state.storage.as_ref()))
            .with_message("Image uploaded successfully!"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/task-images/{id}",
    params(("id" = Uuid, Path, description = "Task image ID")),
    responses(
        (status = 200, description = "Photo deleted", body = ApiResponse<DeletedChild>),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn delete_task_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedChild> {
    let task_id = state.services.tasks.delete_image(id).await?;
    Ok(Json(
        ApiResponse::success(DeletedChild {
            id,
            parent_id: task_id,
        })
        .with_message("Image deleted successfully."),
    ))
}
