use chrono::{DateTime, Duration, Utc};

/// Fee owed when a ride is cancelled at `now`. Anything under an hour before
/// pickup, including pickups already in the past, pays `flat_fee`.
pub fn cancellation_fee(pickup: DateTime<Utc>, now: DateTime<Utc>, flat_fee: i64) -> i64 {
    if pickup - now < Duration::hours(1) {
        flat_fee
    } else {
        0
    }
}
