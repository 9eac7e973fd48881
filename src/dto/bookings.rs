use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, Client, Driver, PaymentMethod, TripType};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestRideRequest {
    pub pickup_address: String,
    pub dropoff_address: String,
    /// Omitted for immediate rides; defaults to the request time.
    pub pickup_datetime: Option<DateTime<Utc>>,
    pub passengers: Option<i32>,
    pub trip_type: Option<TripType>,
    pub payment_method: Option<PaymentMethod>,
    /// Route metrics already shown to the rider. Both must be present to skip
    /// the distance lookup.
    pub distance_meters: Option<u32>,
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminCreateBookingRequest {
    pub client_id: Uuid,
    #[serde(flatten)]
    pub ride: RequestRideRequest,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignDriverRequest {
    pub driver_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FareQuoteRequest {
    pub pickup_address: String,
    pub dropoff_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancellationReceipt {
    pub booking: Booking,
    pub fee: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub client: Client,
    pub driver: Option<Driver>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<BookingSummary>,
}
