//! Per-client ride statistics for the admin roster.

use std::{cmp::Reverse, collections::HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Client};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RosterSort {
    Spend,
    Rides,
    #[default]
    Name,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientRosterEntry {
    pub client: Client,
    pub total_rides: i64,
    pub total_spend: i64,
    pub last_ride_at: Option<DateTime<Utc>>,
    pub is_vip: bool,
}

#[derive(Default)]
struct Totals {
    rides: i64,
    spend: i64,
    last_ride_at: Option<DateTime<Utc>>,
}

/// Only completed rides count toward rides and spend; the fare is the quoted
/// minimum. `last_ride_at` looks at every booking whatever its status.
pub fn build_roster(
    clients: Vec<Client>,
    bookings: &[Booking],
    sort: RosterSort,
    vip_threshold: i64,
) -> Vec<ClientRosterEntry> {
    let mut totals: HashMap<Uuid, Totals> = HashMap::new();
    for booking in bookings {
        let entry = totals.entry(booking.client_id).or_default();
        if booking.status == BookingStatus::Completed {
            entry.rides += 1;
            entry.spend += booking.estimated_fare_min;
        }
        entry.last_ride_at = entry.last_ride_at.max(Some(booking.pickup_datetime));
    }

    let mut roster: Vec<ClientRosterEntry> = clients
        .into_iter()
        .map(|client| {
            let Totals {
                rides,
                spend,
                last_ride_at,
            } = totals.remove(&client.id).unwrap_or_default();
            ClientRosterEntry {
                client,
                total_rides: rides,
                total_spend: spend,
                last_ride_at,
                is_vip: spend > vip_threshold,
            }
        })
        .collect();

    let by_name = |entry: &ClientRosterEntry| entry.client.full_name.to_lowercase();
    match sort {
        RosterSort::Spend => roster.sort_by_key(|e| (Reverse(e.total_spend), by_name(e))),
        RosterSort::Rides => roster.sort_by_key(|e| (Reverse(e.total_rides), by_name(e))),
        RosterSort::Name => roster.sort_by_key(by_name),
    }
    roster
}
