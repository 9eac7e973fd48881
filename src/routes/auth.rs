use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;

use crate::{
    dto::auth::{
        AuthSession, ChangePasswordRequest, CurrentUserResponse, SignInRequest, SignUpRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/guest", post(guest_sign_in))
        .route("/password", post(change_password))
        .route("/me", get(current_user))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Register a client account", body = ApiResponse<AuthSession>),
        (status = 400, description = "Invalid input or email taken")
    ),
    tag = "Auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthSession>>)> {
    let resp = auth_service::sign_up(&state, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Sign in", body = ApiResponse<AuthSession>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let resp = auth_service::sign_in(&state, payload, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/guest",
    responses(
        (status = 200, description = "Anonymous guest session", body = ApiResponse<AuthSession>)
    ),
    tag = "Auth"
)]
pub async fn guest_sign_in(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AuthSession>>> {
    let resp = auth_service::guest_sign_in(&state, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<User>),
        (status = 400, description = "Wrong current password or weak new password"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::change_password(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Signed-in user", body = ApiResponse<CurrentUserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CurrentUserResponse>>> {
    let resp = auth_service::current_user(&state, &user).await?;
    Ok(Json(resp))
}
