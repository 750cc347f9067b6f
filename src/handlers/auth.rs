use crate::{
    auth::{AuthError, AuthUser, TokenResponse},
    ApiResponse, AppState,
};
use axum::{extract::State, response::Json};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"username": "ruth", "password": "correct horse battery staple"}))]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::InvalidCredentials);
    }

    let account = state
        .auth
        .authenticate(payload.username.trim(), &payload.password)
        .await?;
    let token = state.auth.generate_token(&account)?;

    Ok(Json(
        ApiResponse::success(token).with_message("You have been logged in!"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Json<ApiResponse<serde_json::Value>> {
    state.auth.revoke(&user.token_id, user.expires_at);
    info!(username = %user.username, "user logged out");
    Json(
        ApiResponse::success(serde_json::json!({ "username": user.username }))
            .with_message("You have been logged out!"),
    )
}
