pub mod admin_service;
pub mod advice_service;
pub mod auth_service;
pub mod booking_service;
pub mod cancellation;
pub mod client_service;
pub mod distance_service;
pub mod driver_service;
pub mod fare;
pub mod roster;
