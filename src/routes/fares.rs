use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::bookings::FareQuoteRequest,
    error::AppResult,
    response::ApiResponse,
    services::{booking_service, fare::FareEstimate},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote_fare))
}

#[utoipa::path(
    post,
    path = "/api/fares/quote",
    request_body = FareQuoteRequest,
    responses(
        (status = 200, description = "Fare range for the driving route", body = ApiResponse<FareEstimate>),
        (status = 400, description = "No route between the addresses"),
        (status = 502, description = "Distance lookup unavailable")
    ),
    tag = "Fares"
)]
pub async fn quote_fare(
    State(state): State<AppState>,
    Json(payload): Json<FareQuoteRequest>,
) -> AppResult<Json<ApiResponse<FareEstimate>>> {
    let resp = booking_service::quote_fare(&state, payload).await?;
    Ok(Json(resp))
}
