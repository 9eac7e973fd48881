use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::advice::{AdviceRequest, AdviceResponse},
    error::AppResult,
    response::ApiResponse,
    services::advice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(ask_concierge))
}

#[utoipa::path(
    post,
    path = "/api/advice",
    request_body = AdviceRequest,
    responses(
        (status = 200, description = "Concierge answer, or the fallback apology", body = ApiResponse<AdviceResponse>),
        (status = 400, description = "Empty query")
    ),
    tag = "Advice"
)]
pub async fn ask_concierge(
    State(state): State<AppState>,
    Json(payload): Json<AdviceRequest>,
) -> AppResult<Json<ApiResponse<AdviceResponse>>> {
    let resp = advice_service::ask_concierge(&state, payload).await?;
    Ok(Json(resp))
}
