use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::Booking, services::roster::ClientRosterEntry};

/// Only the present fields are changed.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientRoster {
    pub items: Vec<ClientRosterEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientDetail {
    pub summary: ClientRosterEntry,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub today_count: u64,
    pub requested_count: u64,
}
