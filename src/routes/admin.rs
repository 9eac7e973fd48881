use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::{
        bookings::AdminCreateBookingRequest,
        clients::{AdminStats, ClientDetail, ClientRoster},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    routes::params::RosterQuery,
    services::{admin_service, booking_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin_stats))
        .route("/clients", get(client_roster))
        .route("/clients/{id}", get(client_detail))
        .route("/bookings", post(admin_create_booking))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Today's pickups and pending requests", body = ApiResponse<AdminStats>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AdminStats>>> {
    let resp = admin_service::admin_stats(&state, &user, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/clients",
    params(
        ("sort" = Option<String>, Query, description = "spend, rides or name (default)")
    ),
    responses(
        (status = 200, description = "Client roster with ride and spend totals", body = ApiResponse<ClientRoster>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn client_roster(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RosterQuery>,
) -> AppResult<Json<ApiResponse<ClientRoster>>> {
    let resp = admin_service::client_roster(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client totals and bookings", body = ApiResponse<ClientDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn client_detail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ClientDetail>>> {
    let resp = admin_service::client_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/bookings",
    request_body = AdminCreateBookingRequest,
    responses(
        (status = 201, description = "Booking created for a client", body = ApiResponse<Booking>),
        (status = 403, description = "Forbidden or guest quota reached"),
        (status = 404, description = "Client not found"),
        (status = 422, description = "Guest profile incomplete")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AdminCreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = booking_service::admin_create_booking(&state, &user, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
