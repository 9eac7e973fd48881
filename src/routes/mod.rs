use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod advice;
pub mod auth;
pub mod bookings;
pub mod clients;
pub mod doc;
pub mod drivers;
pub mod fares;
pub mod health;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/clients", clients::router())
        .nest("/bookings", bookings::router())
        .nest("/fares", fares::router())
        .nest("/drivers", drivers::router())
        .nest("/admin", admin::router())
        .nest("/advice", advice::router())
}
