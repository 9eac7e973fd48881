//! Booking lifecycle: request, gate, transition, list.
//!
//! Every transition loads the booking under a row lock inside one
//! transaction and checks all preconditions before the single update, so a
//! rejected call leaves the store untouched. Audit rows and feed events are
//! written after commit.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::bookings::{
        AdminCreateBookingRequest, BookingDetail, BookingList, BookingSummary,
        CancellationReceipt, FareQuoteRequest, RequestRideRequest,
    },
    entity::{
        Bookings, Clients, Drivers, Vehicles,
        bookings::{ActiveModel as BookingActive, Column as BookingCol, Model as BookingModel},
        clients::{Column as ClientCol, Model as ClientModel},
        drivers::Column as DriverCol,
    },
    error::{AppError, AppResult, required},
    lifecycle::{BookingAction, transition},
    middleware::auth::{AuthUser, ensure_admin, ensure_role},
    models::{Booking, BookingStatus, Client, Driver, DriverStatus, PaymentStatus, Role},
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, SortOrder},
    services::{
        client_service::client_for_user,
        fare::{FareEstimate, TripMetrics, estimate_fare},
    },
    state::AppState,
};

/// A signed-in client books a ride for themselves.
pub async fn request_ride(
    state: &AppState,
    user: &AuthUser,
    payload: RequestRideRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    ensure_role(user, Role::Client)?;
    let client = client_for_user(&state.orm, user.user_id).await?;
    let booking = create_booking(state, user, client, payload, now).await?;
    Ok(ApiResponse::success("Ride requested", booking, Some(Meta::empty())))
}

/// Dispatcher books on behalf of a client. Guest gating still applies.
pub async fn admin_create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: AdminCreateBookingRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    ensure_admin(user)?;
    let client = Clients::find_by_id(payload.client_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("client"))?;
    let booking = create_booking(state, user, client, payload.ride, now).await?;
    Ok(ApiResponse::success("Booking created", booking, Some(Meta::empty())))
}

pub async fn quote_fare(
    state: &AppState,
    payload: FareQuoteRequest,
) -> AppResult<ApiResponse<FareEstimate>> {
    let pickup = required("pickup_address", &payload.pickup_address)?;
    let dropoff = required("dropoff_address", &payload.dropoff_address)?;
    let metrics = state.distance.driving_metrics(&pickup, &dropoff).await?;
    Ok(ApiResponse::success(
        "Fare estimate",
        estimate_fare(metrics),
        Some(Meta::empty()),
    ))
}

/// Guest quota first, then profile completeness. Registered clients pass.
pub fn check_guest_gate(client: &Client, existing_bookings: u64, limit: u64) -> AppResult<()> {
    if !client.is_guest {
        return Ok(());
    }
    if existing_bookings >= limit {
        return Err(AppError::GuestQuotaExceeded { limit });
    }
    let missing = client.missing_profile_fields();
    if !missing.is_empty() {
        return Err(AppError::IncompleteGuestProfile { missing });
    }
    Ok(())
}

async fn create_booking(
    state: &AppState,
    actor: &AuthUser,
    client: ClientModel,
    payload: RequestRideRequest,
    now: DateTime<Utc>,
) -> AppResult<Booking> {
    let pickup = required("pickup_address", &payload.pickup_address)?;
    let dropoff = required("dropoff_address", &payload.dropoff_address)?;
    let passengers = payload.passengers.unwrap_or(1);
    if passengers < 1 {
        return Err(AppError::validation("passengers must be at least 1"));
    }

    let client = Client::from(client);
    let existing = if client.is_guest {
        Bookings::find()
            .filter(BookingCol::ClientId.eq(client.id))
            .count(&state.orm)
            .await?
    } else {
        0
    };
    check_guest_gate(&client, existing, state.policy().guest_booking_limit)?;

    let metrics = match (payload.distance_meters, payload.duration_seconds) {
        (Some(distance_meters), Some(duration_seconds)) => TripMetrics {
            distance_meters,
            duration_seconds,
        },
        _ => state.distance.driving_metrics(&pickup, &dropoff).await?,
    };
    let fare = estimate_fare(metrics);

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        client_id: Set(client.id),
        driver_id: Set(None),
        pickup_address: Set(pickup),
        dropoff_address: Set(dropoff),
        pickup_datetime: Set(payload.pickup_datetime.unwrap_or(now).fixed_offset()),
        passengers: Set(passengers),
        trip_type: Set(payload.trip_type.unwrap_or_default().as_str().to_string()),
        status: Set(BookingStatus::Requested.as_str().to_string()),
        estimated_fare_min: Set(fare.min_fare),
        estimated_fare_max: Set(fare.max_fare),
        payment_method: Set(payload.payment_method.unwrap_or_default().as_str().to_string()),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        cancellation_fee: Set(None),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(now.fixed_offset()),
    }
    .insert(&state.orm)
    .await?;

    record_audit(
        &state.orm,
        Some(actor.user_id),
        "booking_request",
        "bookings",
        json!({
            "booking_id": booking.id,
            "client_id": client.id,
            "fare_min": fare.min_fare,
            "fare_max": fare.max_fare,
        }),
    )
    .await;
    tracing::info!(booking_id = %booking.id, client_id = %client.id, status = "requested", "ride requested");

    Booking::try_from(booking)
}

pub async fn confirm_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    let booking = apply_transition(state, user, id, Transition::Confirm, now).await?;
    Ok(ApiResponse::success("Booking confirmed", booking, Some(Meta::empty())))
}

pub async fn reject_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    let booking = apply_transition(state, user, id, Transition::Reject, now).await?;
    Ok(ApiResponse::success("Booking rejected", booking, Some(Meta::empty())))
}

/// Cancels and reports the fee charged under the cancellation policy.
pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<CancellationReceipt>> {
    let booking = apply_transition(state, user, id, Transition::Cancel, now).await?;
    let fee = booking.cancellation_fee.unwrap_or(0);
    Ok(ApiResponse::success(
        "Booking cancelled",
        CancellationReceipt { booking, fee },
        Some(Meta::empty()),
    ))
}

pub async fn start_trip(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    let booking = apply_transition(state, user, id, Transition::StartTrip, now).await?;
    Ok(ApiResponse::success("Trip started", booking, Some(Meta::empty())))
}

pub async fn complete_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    let booking = apply_transition(state, user, id, Transition::Complete, now).await?;
    Ok(ApiResponse::success("Booking completed", booking, Some(Meta::empty())))
}

pub async fn assign_driver(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    driver_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Booking>> {
    let booking =
        apply_transition(state, user, id, Transition::AssignDriver(driver_id), now).await?;
    Ok(ApiResponse::success("Driver assigned", booking, Some(Meta::empty())))
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Confirm,
    Reject,
    Cancel,
    StartTrip,
    Complete,
    AssignDriver(Uuid),
}

impl Transition {
    fn action(self) -> BookingAction {
        match self {
            Transition::Confirm => BookingAction::Confirm,
            Transition::Reject => BookingAction::Reject,
            Transition::Cancel => BookingAction::Cancel,
            Transition::StartTrip => BookingAction::StartTrip,
            Transition::Complete => BookingAction::Complete,
            Transition::AssignDriver(_) => BookingAction::AssignDriver,
        }
    }
}

async fn apply_transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    requested: Transition,
    now: DateTime<Utc>,
) -> AppResult<Booking> {
    let action = requested.action();
    let txn = state.orm.begin().await?;

    let model = Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("booking"))?;

    authorize_action(&txn, user, &model, action).await?;

    let from: BookingStatus = model.status.parse()?;
    let next = transition(from, action)?;

    let mut changes = Map::new();
    changes.insert("status".into(), json!(next));
    changes.insert("updated_at".into(), json!(now));

    let mut active: BookingActive = model.clone().into();
    match requested {
        Transition::AssignDriver(driver_id) => {
            let driver = Drivers::find_by_id(driver_id)
                .one(&txn)
                .await?
                .ok_or(AppError::NotFound("driver"))?;
            if driver.status.parse::<DriverStatus>()? != DriverStatus::Active {
                return Err(AppError::validation("driver is inactive"));
            }
            active.driver_id = Set(Some(driver_id));
            changes.insert("driver_id".into(), json!(driver_id));
        }
        Transition::StartTrip => {
            if model.driver_id.is_none() {
                return Err(AppError::validation(
                    "assign a driver before starting the trip",
                ));
            }
        }
        Transition::Cancel => {
            let fee = state
                .policy()
                .cancellation_fee(model.pickup_datetime.with_timezone(&Utc), now);
            active.cancellation_fee = Set(Some(fee));
            changes.insert("cancellation_fee".into(), json!(fee));
        }
        Transition::Complete => {
            if let Some(driver_id) = model.driver_id {
                Drivers::update_many()
                    .col_expr(DriverCol::TotalTrips, Expr::col(DriverCol::TotalTrips).add(1))
                    .filter(DriverCol::Id.eq(driver_id))
                    .exec(&txn)
                    .await?;
            }
        }
        Transition::Confirm | Transition::Reject => {}
    }

    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(now.fixed_offset());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    record_audit(
        &state.orm,
        Some(user.user_id),
        action.audit_name(),
        "bookings",
        json!({
            "booking_id": id,
            "from": from,
            "to": next,
            "changes": Value::Object(changes.clone()),
        }),
    )
    .await;
    state.feed.publish(id, changes);
    tracing::info!(booking_id = %id, %action, from = %from, status = %next, "booking updated");

    Booking::try_from(updated)
}

/// Admin may run every transition; the assigned driver may start and complete
/// the trip; the owning client may cancel.
async fn authorize_action(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    booking: &BookingModel,
    action: BookingAction,
) -> AppResult<()> {
    if user.is_admin() {
        return Ok(());
    }
    match user.role {
        Role::Client if action == BookingAction::Cancel => {
            let client = client_for_user(txn, user.user_id).await?;
            if client.id == booking.client_id {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
        Role::Driver if matches!(action, BookingAction::StartTrip | BookingAction::Complete) => {
            if is_assigned_driver(txn, user, booking).await? {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
        _ => Err(AppError::Forbidden),
    }
}

async fn is_assigned_driver<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    booking: &BookingModel,
) -> AppResult<bool> {
    let Some(driver_id) = booking.driver_id else {
        return Ok(false);
    };
    let driver = Drivers::find()
        .filter(DriverCol::UserId.eq(user.user_id))
        .one(conn)
        .await?;
    Ok(driver.is_some_and(|driver| driver.id == driver_id))
}

/// Booking with its client and assigned driver (plus vehicle).
pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    let (booking, client) = Bookings::find_by_id(id)
        .find_also_related(Clients)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("booking"))?;
    let client = client.ok_or(AppError::NotFound("client"))?;

    let allowed = if user.is_admin() {
        true
    } else if user.role == Role::Driver {
        is_assigned_driver(&state.orm, user, &booking).await?
    } else {
        client.user_id == Some(user.user_id)
    };
    if !allowed {
        return Err(AppError::Forbidden);
    }

    let driver = match booking.driver_id {
        Some(driver_id) => {
            let (driver, vehicle) = Drivers::find_by_id(driver_id)
                .find_also_related(Vehicles)
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound("driver"))?;
            Some(Driver::from_entity(driver, vehicle)?)
        }
        None => None,
    };

    let data = BookingDetail {
        booking: Booking::try_from(booking)?,
        client: Client::from(client),
        driver,
    };
    Ok(ApiResponse::success("Booking", data, Some(Meta::empty())))
}

/// Bookings visible to the caller, ordered by pickup time. `q` matches client
/// name, pickup or dropoff address as a case-insensitive substring.
pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let pagination = query.pagination();
    let (_, limit, offset) = pagination.normalize();

    let mut condition = Condition::all();
    match user.role {
        Role::Admin => {}
        Role::Client => {
            let client = client_for_user(&state.orm, user.user_id).await?;
            condition = condition.add(BookingCol::ClientId.eq(client.id));
        }
        Role::Driver => {
            let driver = Drivers::find()
                .filter(DriverCol::UserId.eq(user.user_id))
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound("driver"))?;
            condition = condition.add(BookingCol::DriverId.eq(driver.id));
        }
    }

    if let Some(status) = query.status {
        condition = condition.add(BookingCol::Status.eq(status.as_str()));
    }
    if let Some(from) = query.from {
        condition = condition.add(BookingCol::PickupDatetime.gte(from.fixed_offset()));
    }
    if let Some(to) = query.to {
        condition = condition.add(BookingCol::PickupDatetime.lte(to.fixed_offset()));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let matched = text_match(&state.orm, condition.clone(), q).await?;
        condition = condition.add(matched);
    }

    let mut finder = Bookings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(BookingCol::PickupDatetime),
        SortOrder::Desc => finder.order_by_desc(BookingCol::PickupDatetime),
    }
    .order_by_asc(BookingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;

    let rows = finder
        .find_also_related(Clients)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(booking, client)| {
            Ok(BookingSummary {
                booking: Booking::try_from(booking)?,
                client_name: client.map(|client| client.full_name),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::for_page(&pagination, total)),
    ))
}

/// Bookings in `scope` whose client name, pickup or dropoff address contains
/// `q`. Matching is a literal substring test on Unicode-lowercased text, so
/// `%` and `_` carry no meaning and accented capitals fold.
async fn text_match<C: ConnectionTrait>(
    conn: &C,
    scope: Condition,
    q: &str,
) -> AppResult<Condition> {
    let needle = q.to_lowercase();
    let contains = |text: &str| text.to_lowercase().contains(&needle);

    let names: Vec<(Uuid, String)> = Clients::find()
        .select_only()
        .column(ClientCol::Id)
        .column(ClientCol::FullName)
        .into_tuple()
        .all(conn)
        .await?;
    let named: HashSet<Uuid> = names
        .into_iter()
        .filter(|(_, name)| contains(name.as_str()))
        .map(|(id, _)| id)
        .collect();

    let candidates: Vec<(Uuid, Uuid, String, String)> = Bookings::find()
        .select_only()
        .column(BookingCol::Id)
        .column(BookingCol::ClientId)
        .column(BookingCol::PickupAddress)
        .column(BookingCol::DropoffAddress)
        .filter(scope)
        .into_tuple()
        .all(conn)
        .await?;
    let ids: Vec<Uuid> = candidates
        .into_iter()
        .filter(|(_, client_id, pickup, dropoff)| {
            named.contains(client_id) || contains(pickup.as_str()) || contains(dropoff.as_str())
        })
        .map(|(id, ..)| id)
        .collect();

    Ok(Condition::all().add(BookingCol::Id.is_in(ids)))
}
