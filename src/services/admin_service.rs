use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::clients::{AdminStats, ClientDetail, ClientRoster},
    entity::{
        Bookings, Clients,
        bookings::Column as BookingCol,
        clients::Column as ClientCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Booking, BookingStatus, Client},
    response::{ApiResponse, Meta},
    routes::params::RosterQuery,
    services::roster::{RosterSort, build_roster},
    state::AppState,
};

/// Counts for the dispatcher dashboard. "Today" is the UTC day containing `now`.
pub async fn admin_stats(
    state: &AppState,
    user: &AuthUser,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<AdminStats>> {
    ensure_admin(user)?;

    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid day start")))?
        .and_utc();
    let day_end = day_start + Duration::days(1);

    let today_count = Bookings::find()
        .filter(
            Condition::all()
                .add(BookingCol::PickupDatetime.gte(day_start.fixed_offset()))
                .add(BookingCol::PickupDatetime.lt(day_end.fixed_offset())),
        )
        .count(&state.orm)
        .await?;

    let requested_count = Bookings::find()
        .filter(BookingCol::Status.eq(BookingStatus::Requested.as_str()))
        .count(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Stats",
        AdminStats {
            today_count,
            requested_count,
        },
        Some(Meta::empty()),
    ))
}

pub async fn client_roster(
    state: &AppState,
    user: &AuthUser,
    query: RosterQuery,
) -> AppResult<ApiResponse<ClientRoster>> {
    ensure_admin(user)?;

    let clients: Vec<Client> = Clients::find()
        .order_by_asc(ClientCol::FullName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Client::from)
        .collect();
    let bookings = Bookings::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Booking::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let items = build_roster(
        clients,
        &bookings,
        query.sort.unwrap_or_default(),
        state.policy().vip_spend_threshold,
    );
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Ok", ClientRoster { items }, Some(meta)))
}

/// Roster figures for one client plus their bookings, newest pickup first.
pub async fn client_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ClientDetail>> {
    ensure_admin(user)?;

    let client = Clients::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Client::from)
        .ok_or(AppError::NotFound("client"))?;

    let bookings = Bookings::find()
        .filter(BookingCol::ClientId.eq(id))
        .order_by_desc(BookingCol::PickupDatetime)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Booking::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    let summary = build_roster(
        vec![client],
        &bookings,
        RosterSort::Name,
        state.policy().vip_spend_threshold,
    )
    .into_iter()
    .next()
    .ok_or(AppError::NotFound("client"))?;

    Ok(ApiResponse::success(
        "Client",
        ClientDetail { summary, bookings },
        Some(Meta::empty()),
    ))
}
