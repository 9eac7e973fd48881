#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use ride_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::bookings::RequestRideRequest,
    entity::{
        clients::ActiveModel as ClientActive, drivers::ActiveModel as DriverActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::{DriverStatus, Role},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Fresh in-memory store with the schema applied. No maps or advice keys, so
/// collaborators answer with their fallbacks.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let config = AppConfig::new("sqlite::memory:", "integration-secret");
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    AppState::new(orm, config)
}

pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(Some(format!("{id}@example.com"))),
        password_hash: Set(None),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser { user_id: id, role })
}

pub async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, Role::Admin).await
}

/// A signed-in client with a profile. Guests get placeholder details.
pub async fn client(state: &AppState, full_name: &str, is_guest: bool) -> anyhow::Result<(AuthUser, Uuid)> {
    let user = create_user(state, Role::Client).await?;
    let (phone, email) = if is_guest {
        (String::new(), String::new())
    } else {
        ("+1 555 0100".to_string(), format!("{}@example.com", full_name.to_lowercase().replace(' ', ".")))
    };
    let client = ClientActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        full_name: Set(full_name.to_string()),
        phone: Set(phone),
        email: Set(email),
        is_guest: Set(is_guest),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?;
    Ok((user, client.id))
}

pub async fn driver(state: &AppState, status: DriverStatus) -> anyhow::Result<(AuthUser, Uuid)> {
    let user = create_user(state, Role::Driver).await?;
    let driver = DriverActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        full_name: Set("James Anderson".to_string()),
        phone: Set("+1 555 9876 5432".to_string()),
        email: Set(None),
        status: Set(status.as_str().to_string()),
        rating: Set(5.0),
        total_trips: Set(0),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?;
    Ok((user, driver.id))
}

/// Ride with known route metrics so no distance lookup happens.
pub fn ride(pickup: &str, dropoff: &str, pickup_at: DateTime<Utc>) -> RequestRideRequest {
    RequestRideRequest {
        pickup_address: pickup.to_string(),
        dropoff_address: dropoff.to_string(),
        pickup_datetime: Some(pickup_at),
        passengers: Some(1),
        trip_type: None,
        payment_method: None,
        distance_meters: Some(20_000),
        duration_seconds: Some(1_800),
    }
}

pub fn in_hours(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}
