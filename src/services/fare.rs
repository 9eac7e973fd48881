//! Linear fare estimate shown before a ride is requested.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const BASE_FARE: f64 = 25.0;
pub const PRICE_PER_KM: f64 = 2.2;
pub const PRICE_PER_MIN: f64 = 0.3;

const LOW_BAND: f64 = 0.9;
const HIGH_BAND: f64 = 1.1;

/// Driving distance and time between pickup and dropoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TripMetrics {
    pub distance_meters: u32,
    pub duration_seconds: u32,
}

impl TripMetrics {
    /// Used when no maps key is configured: 20 km, 30 minutes.
    pub const FALLBACK: TripMetrics = TripMetrics {
        distance_meters: 20_000,
        duration_seconds: 1_800,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FareEstimate {
    pub distance_km: f64,
    pub duration_minutes: i64,
    pub min_fare: i64,
    pub max_fare: i64,
}

pub fn estimate_fare(metrics: TripMetrics) -> FareEstimate {
    let distance_km = f64::from(metrics.distance_meters) / 1000.0;
    let duration_minutes = f64::from(metrics.duration_seconds) / 60.0;

    let raw = BASE_FARE + distance_km * PRICE_PER_KM + duration_minutes * PRICE_PER_MIN;

    FareEstimate {
        distance_km: (distance_km * 100.0).round() / 100.0,
        duration_minutes: duration_minutes.round() as i64,
        min_fare: (raw * LOW_BAND).round() as i64,
        max_fare: (raw * HIGH_BAND).round() as i64,
    }
}
