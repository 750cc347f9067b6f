//! select2 lookups. Anonymous callers get an empty list rather than a 401.

use crate::{
    auth::AuthUser,
    handlers::common::LookupQuery,
    services::{LookupOption, LookupPage},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

pub fn autocomplete_routes() -> Router<AppState> {
    Router::new()
        .route("/tenants", get(tenant_lookup))
        .route("/properties", get(property_lookup))
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LookupPagination {
    pub more: bool,
}

/// Response shape select2 expects.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct LookupResponse {
    pub results: Vec<LookupOption>,
    pub pagination: LookupPagination,
}

impl From<LookupPage> for LookupResponse {
    fn from(page: LookupPage) -> Self {
        Self {
            results: page.results,
            pagination: LookupPagination { more: page.more },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/autocomplete/tenants",
    params(LookupQuery),
    responses(
        (status = 200, description = "A page of up to 10 tenants matching first or last name", body = LookupResponse)
    ),
    tag = "autocomplete"
)]
pub async fn tenant_lookup(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, crate::errors::ServiceError> {
    if user.is_none() {
        return Ok(Json(LookupResponse::default()));
    }
    let page = state
        .services
        .tenants
        .autocomplete(query.q.as_deref(), query.page)
        .await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/autocomplete/properties",
    params(LookupQuery),
    responses(
        (status = 200, description = "A page of up to 10 properties matching the address", body = LookupResponse)
    ),
    tag = "autocomplete"
)]
pub async fn property_lookup(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, crate::errors::ServiceError> {
    if user.is_none() {
        return Ok(Json(LookupResponse::default()));
    }
    let page = state
        .services
        .properties
        .autocomplete(query.q.as_deref(), query.page)
        .await?;
    Ok(Json(page.into()))
}
