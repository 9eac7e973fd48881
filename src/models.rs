use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{bookings, clients, drivers, users, vehicles},
    error::AppError,
};

/// Display name given to anonymous clients until they fill in their profile.
pub const GUEST_PLACEHOLDER_NAME: &str = "Guest";

#[derive(Debug, Error)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl From<UnknownVariant> for AppError {
    fn from(err: UnknownVariant) -> Self {
        AppError::Internal(err.into())
    }
}

/// Enums persisted as text columns: `as_str` is the stored form and the wire form.
macro_rules! text_enum {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Driver,
    Admin,
}

text_enum!(Role, "role" {
    Client => "client",
    Driver => "driver",
    Admin => "admin",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    OnTheWay,
    Completed,
    Cancelled,
}

text_enum!(BookingStatus, "booking status" {
    Requested => "requested",
    Confirmed => "confirmed",
    OnTheWay => "on_the_way",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Zelle,
    Card,
}

text_enum!(PaymentMethod, "payment method" {
    Cash => "cash",
    Zelle => "zelle",
    Card => "card",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

text_enum!(PaymentStatus, "payment status" {
    Pending => "pending",
    Paid => "paid",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Airport,
    #[default]
    PointToPoint,
    Hourly,
}

text_enum!(TripType, "trip type" {
    Airport => "airport",
    PointToPoint => "point_to_point",
    Hourly => "hourly",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Active,
    #[default]
    Inactive,
}

text_enum!(DriverStatus, "driver status" {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub is_guest: bool,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Profile fields that still hold placeholder or empty values.
    pub fn missing_profile_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let name = self.full_name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(GUEST_PLACEHOLDER_NAME) {
            missing.push("full_name");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if !self.email.contains('@') {
            missing.push("email");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vehicle {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub make: String,
    pub model: String,
    pub color: String,
    pub plate_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Driver {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub status: DriverStatus,
    pub rating: f64,
    pub total_trips: i32,
    pub vehicle: Option<Vehicle>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub client_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_datetime: DateTime<Utc>,
    pub passengers: i32,
    pub trip_type: TripType,
    pub status: BookingStatus,
    pub estimated_fare_min: i64,
    pub estimated_fare_max: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub cancellation_fee: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<users::Model> for User {
    type Error = AppError;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        Ok(User {
            id: model.id,
            email: model.email,
            role: model.role.parse()?,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl From<clients::Model> for Client {
    fn from(model: clients::Model) -> Self {
        Client {
            id: model.id,
            user_id: model.user_id,
            full_name: model.full_name,
            phone: model.phone,
            email: model.email,
            is_guest: model.is_guest,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<vehicles::Model> for Vehicle {
    fn from(model: vehicles::Model) -> Self {
        Vehicle {
            id: model.id,
            driver_id: model.driver_id,
            make: model.make,
            model: model.model,
            color: model.color,
            plate_number: model.plate_number,
        }
    }
}

impl Driver {
    pub fn from_entity(
        model: drivers::Model,
        vehicle: Option<vehicles::Model>,
    ) -> Result<Self, AppError> {
        Ok(Driver {
            id: model.id,
            user_id: model.user_id,
            full_name: model.full_name,
            phone: model.phone,
            email: model.email,
            status: model.status.parse()?,
            rating: model.rating,
            total_trips: model.total_trips,
            vehicle: vehicle.map(Vehicle::from),
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}

impl TryFrom<bookings::Model> for Booking {
    type Error = AppError;

    fn try_from(model: bookings::Model) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: model.id,
            client_id: model.client_id,
            driver_id: model.driver_id,
            pickup_address: model.pickup_address,
            dropoff_address: model.dropoff_address,
            pickup_datetime: model.pickup_datetime.with_timezone(&Utc),
            passengers: model.passengers,
            trip_type: model.trip_type.parse()?,
            status: model.status.parse()?,
            estimated_fare_min: model.estimated_fare_min,
            estimated_fare_max: model.estimated_fare_max,
            payment_method: model.payment_method.parse()?,
            payment_status: model.payment_status.parse()?,
            cancellation_fee: model.cancellation_fee,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}
