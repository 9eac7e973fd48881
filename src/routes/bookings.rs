use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    dto::bookings::{
        AssignDriverRequest, BookingDetail, BookingList, CancellationReceipt, RequestRideRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, decode_token},
    models::{Booking, BookingStatus},
    realtime::BookingSubscription,
    response::ApiResponse,
    routes::params::{BookingListQuery, LiveQuery},
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(request_ride))
        .route("/{id}", get(get_booking))
        .route("/{id}/confirm", post(confirm_booking))
        .route("/{id}/reject", post(reject_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .route("/{id}/start", post(start_trip))
        .route("/{id}/complete", post(complete_booking))
        .route("/{id}/driver", post(assign_driver))
        .route("/{id}/live", get(booking_live_ws))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<BookingStatus>, Query, description = "Filter by status"),
        ("from" = Option<String>, Query, description = "Earliest pickup (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Latest pickup (RFC 3339)"),
        ("q" = Option<String>, Query, description = "Client name, pickup or dropoff contains"),
        ("sort_order" = Option<String>, Query, description = "Pickup order: asc, desc")
    ),
    responses(
        (status = 200, description = "Bookings visible to the caller", body = ApiResponse<BookingList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = RequestRideRequest,
    responses(
        (status = 201, description = "Ride requested", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid addresses or passengers"),
        (status = 403, description = "Guest booking quota reached"),
        (status = 422, description = "Guest profile incomplete"),
        (status = 502, description = "Distance lookup unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn request_ride(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RequestRideRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = booking_service::request_ride(&state, &user, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking with client and driver", body = ApiResponse<BookingDetail>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let resp = booking_service::get_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking confirmed", body = ApiResponse<Booking>),
        (status = 409, description = "Booking is not requested")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::confirm_booking(&state, &user, id, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/reject",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking rejected", body = ApiResponse<Booking>),
        (status = 409, description = "Booking is not requested")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn reject_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::reject_booking(&state, &user, id, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled with the fee charged", body = ApiResponse<CancellationReceipt>),
        (status = 409, description = "Booking already completed or cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CancellationReceipt>>> {
    let resp = booking_service::cancel_booking(&state, &user, id, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/start",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Driver on the way", body = ApiResponse<Booking>),
        (status = 400, description = "No driver assigned"),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn start_trip(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::start_trip(&state, &user, id, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking completed", body = ApiResponse<Booking>),
        (status = 409, description = "Trip has not started")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::complete_booking(&state, &user, id, Utc::now()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/driver",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = AssignDriverRequest,
    responses(
        (status = 200, description = "Driver assigned", body = ApiResponse<Booking>),
        (status = 400, description = "Driver inactive"),
        (status = 404, description = "Booking or driver not found"),
        (status = 409, description = "Booking already under way or finished")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn assign_driver(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignDriverRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp =
        booking_service::assign_driver(&state, &user, id, payload.driver_id, Utc::now()).await?;
    Ok(Json(resp))
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LiveEvent {
    Snapshot { booking: BookingDetail },
    Change { changes: Map<String, Value> },
    End,
}

/// Streams the booking snapshot and then every partial change. Browsers cannot
/// set headers on websocket requests, so the bearer token rides in the query.
pub async fn booking_live_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LiveQuery>,
) -> AppResult<impl IntoResponse> {
    let user = decode_token(&state.config, &query.token)?;

    // Subscribe first so no change between snapshot and stream is lost.
    let subscription = state.feed.subscribe(id);
    let snapshot = booking_service::get_booking(&state, &user, id)
        .await?
        .into_data();

    Ok(ws.on_upgrade(move |socket| async move {
        if let Some(booking) = snapshot {
            stream_booking(socket, booking, subscription).await;
        }
    }))
}

async fn stream_booking(
    socket: WebSocket,
    snapshot: BookingDetail,
    mut subscription: BookingSubscription,
) {
    let (mut sender, mut receiver) = socket.split();
    let booking_id = snapshot.booking.id;
    let finished = snapshot.booking.status.is_terminal();

    if send_event(&mut sender, &LiveEvent::Snapshot { booking: snapshot })
        .await
        .is_err()
    {
        return;
    }
    if finished {
        let _ = send_event(&mut sender, &LiveEvent::End).await;
        return;
    }

    loop {
        tokio::select! {
            change = subscription.next() => {
                let Some(change) = change else {
                    let _ = send_event(&mut sender, &LiveEvent::End).await;
                    return;
                };
                let terminal = change
                    .changes
                    .get("status")
                    .and_then(Value::as_str)
                    .and_then(|status| status.parse::<BookingStatus>().ok())
                    .is_some_and(|status| status.is_terminal());
                if send_event(&mut sender, &LiveEvent::Change { changes: change.changes }).await.is_err() {
                    return;
                }
                if terminal {
                    let _ = send_event(&mut sender, &LiveEvent::End).await;
                    return;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(%booking_id, "live booking subscriber left");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn send_event<S>(sender: &mut S, event: &LiveEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let text = serde_json::to_string(event).map_err(|err| {
        tracing::error!(error = %err, "live event not serializable");
    })?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}
