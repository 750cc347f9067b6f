use crate::{
    handlers::tasks::TaskSummary,
    services::{dashboard::Dashboard, tasks::LogbookSort, today},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// 1-12; only used together with `year`
    pub month: Option<String>,
    /// 1900-2100; only used together with `month`
    pub year: Option<String>,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogbookQuery {
    /// `pending`, `not_pending`, `completed_asc`, `completed_desc`,
    /// `reported_asc`, `reported_desc`, `job_id_desc` or `job_id_asc` (default)
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Logbook {
    pub tasks: Vec<TaskSummary>,
    pub current_sort: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Certificate expiry dashboard", body = ApiResponse<Dashboard>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Dashboard> {
    let dashboard = state
        .services
        .dashboard
        .build(today(), query.month.as_deref(), query.year.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/v1/logbook",
    params(LogbookQuery),
    responses(
        (status = 200, description = "Sorted maintenance logbook", body = ApiResponse<Logbook>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "tasks"
)]
pub async fn logbook(
    State(state): State<AppState>,
    Query(query): Query<LogbookQuery>,
) -> ApiResult<Logbook> {
    let sort = LogbookSort::parse(query.sort_by.as_deref());
    let rows = state.services.tasks.logbook(sort).await?;
    Ok(Json(ApiResponse::success(Logbook {
        tasks: rows.into_iter().map(TaskSummary::from).collect(),
        current_sort: sort.key().to_string(),
    })))
}
