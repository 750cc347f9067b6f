//! Pynnacle API Library
//!
//! Back office for a lettings business: properties with their certificate
//! and document folders, tenants and tenancies, maintenance jobs and the
//! certificate expiry dashboard.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod storage;
pub mod tracing;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::middleware_helpers::{allowed_hosts_middleware, AllowedHosts};
use crate::storage::FileStorage;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// Wires services, auth and storage around an open connection.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        storage: Arc<dyn FileStorage>,
        root_logger: &slog::Logger,
    ) -> Self {
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from_app_config(&config),
            db.clone(),
        ));
        let services = handlers::AppServices::new(db.clone(), storage.clone(), root_logger);
        Self {
            db,
            config,
            services,
            auth,
            storage,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    /// Attaches the user-facing flash message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Everything mounted under `/api/v1`.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let staff = Router::new()
        .nest("/properties", handlers::properties::property_routes())
        .nest("/folders", handlers::folders::folder_routes())
        .nest("/documents", handlers::folders::document_routes())
        .nest("/tenants", handlers::tenants::tenant_routes())
        .nest("/tenant-images", handlers::tenants::tenant_image_routes())
        .nest("/tasks", handlers::tasks::task_routes())
        .nest("/task-images", handlers::tasks::task_image_routes())
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route("/logbook", get(handlers::dashboard::logbook))
        .route("/auth/logout", post(handlers::auth::logout))
        .with_auth(auth.clone());

    // select2 calls these without failing the page for anonymous visitors
    let lookups = Router::new()
        .nest("/autocomplete", handlers::autocomplete::autocomplete_routes())
        .with_optional_auth(auth);

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login))
        .merge(staff)
        .merge(lookups)
}

/// Full application router with request id, tracing, host check and body limit.
pub fn app_router(state: AppState) -> Router {
    let mut router = Router::<AppState>::new()
        .route("/", get(|| async { "pynnacle-api up" }))
        .nest("/api/v1", api_v1_routes(state.auth.clone()))
        .merge(openapi::swagger_ui());

    let storage = &state.config.storage;
    if storage.is_local() && storage.media_url.starts_with('/') {
        let media = Router::new()
            .nest_service(&storage.media_url, ServeDir::new(&storage.media_root))
            .with_auth(state.auth.clone());
        router = router.merge(media);
    }

    if let Some(allowed) = AllowedHosts::from_config(&state.config) {
        router = router.layer(axum::middleware::from_fn_with_state(
            Arc::new(allowed),
            allowed_hosts_middleware,
        ));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses((status = 200, description = "Service status", body = ApiResponse<serde_json::Value>)),
    tag = "status"
)]
pub async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "service": "pynnacle-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Dependency health", body = ApiResponse<serde_json::Value>)),
    tag = "status"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match db::check_connection(&state.db).await {
        Ok(()) => "healthy",
        Err(err) => {
            ::tracing::warn!(error = %err, "database health check failed");
            "unhealthy"
        }
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
            "storage": state.storage.backend_name(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
