use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::clients::UpdateProfileRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Client,
    response::ApiResponse,
    services::client_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(get_my_profile).patch(update_my_profile))
}

#[utoipa::path(
    get,
    path = "/api/clients/me",
    responses(
        (status = 200, description = "Signed-in client's profile", body = ApiResponse<Client>),
        (status = 404, description = "No client profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn get_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Client>>> {
    let resp = client_service::get_my_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/clients/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Client>),
        (status = 400, description = "Empty field or invalid email")
    ),
    security(("bearer_auth" = [])),
    tag = "Clients"
)]
pub async fn update_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Client>>> {
    let resp = client_service::update_my_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
