use std::{env, str::FromStr};

use chrono::{DateTime, Duration, Utc};

use crate::services::cancellation::cancellation_fee;

const DEFAULT_ADVICE_MODEL: &str = "gemini-2.0-flash";

/// Tunable booking rules. Defaults match the values the product launched with.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPolicy {
    /// Flat fee charged when a ride is cancelled less than an hour before pickup.
    pub cancellation_fee: i64,
    /// Total bookings (any status) a guest account may hold.
    pub guest_booking_limit: u64,
    /// Completed-ride spend above which a client is flagged VIP.
    pub vip_spend_threshold: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            cancellation_fee: 7,
            guest_booking_limit: 3,
            vip_spend_threshold: 500,
        }
    }
}

impl BookingPolicy {
    pub fn cancellation_fee(&self, pickup: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        cancellation_fee(pickup, now, self.cancellation_fee)
    }

    pub fn is_vip(&self, total_spend: i64) -> bool {
        total_spend > self.vip_spend_threshold
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub maps_api_key: Option<String>,
    pub advice_api_key: Option<String>,
    pub advice_model: String,
    pub policy: BookingPolicy,
}

impl AppConfig {
    /// Config with local defaults for everything but the database and signing secret.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::hours(24),
            maps_api_key: None,
            advice_api_key: None,
            advice_model: DEFAULT_ADVICE_MODEL.to_string(),
            policy: BookingPolicy::default(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")?;
        let mut config = Self::new(database_url, jwt_secret);

        config.host = env::var("APP_HOST").unwrap_or(config.host);
        config.port = parse_or("APP_PORT", config.port);
        config.maps_api_key = optional("GOOGLE_MAPS_API_KEY");
        config.advice_api_key = optional("ADVICE_API_KEY");
        if let Some(model) = optional("ADVICE_MODEL") {
            config.advice_model = model;
        }

        let defaults = BookingPolicy::default();
        config.policy = BookingPolicy {
            cancellation_fee: parse_or("CANCELLATION_FEE", defaults.cancellation_fee),
            guest_booking_limit: parse_or("GUEST_BOOKING_LIMIT", defaults.guest_booking_limit),
            vip_spend_threshold: parse_or("VIP_SPEND_THRESHOLD", defaults.vip_spend_threshold),
        };

        Ok(config)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}
