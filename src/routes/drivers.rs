use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::drivers::{DriverList, SaveDriverRequest, SetDriverStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Driver,
    response::ApiResponse,
    services::driver_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/{id}", get(get_driver).put(update_driver))
        .route("/{id}/status", patch(set_driver_status))
}

#[utoipa::path(
    get,
    path = "/api/drivers",
    responses(
        (status = 200, description = "Drivers by name with their vehicle", body = ApiResponse<DriverList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Drivers"
)]
pub async fn list_drivers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DriverList>>> {
    let resp = driver_service::list_drivers(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    params(("id" = Uuid, Path, description = "Driver id")),
    responses(
        (status = 200, description = "Driver with vehicle", body = ApiResponse<Driver>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Drivers"
)]
pub async fn get_driver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::get_driver(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = SaveDriverRequest,
    responses(
        (status = 201, description = "Driver created", body = ApiResponse<Driver>),
        (status = 400, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Drivers"
)]
pub async fn create_driver(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SaveDriverRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Driver>>)> {
    let resp = driver_service::save_driver(&state, &user, None, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    params(("id" = Uuid, Path, description = "Driver id")),
    request_body = SaveDriverRequest,
    responses(
        (status = 200, description = "Driver updated", body = ApiResponse<Driver>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Drivers"
)]
pub async fn update_driver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveDriverRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::save_driver(&state, &user, Some(id), payload, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/drivers/{id}/status",
    params(("id" = Uuid, Path, description = "Driver id")),
    request_body = SetDriverStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Driver>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Drivers"
)]
pub async fn set_driver_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetDriverStatusRequest>,
) -> AppResult<Json<ApiResponse<Driver>>> {
    let resp = driver_service::set_driver_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
