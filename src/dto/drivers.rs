use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Driver, DriverStatus};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VehicleInput {
    pub make: String,
    pub model: String,
    pub color: String,
    pub plate_number: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveDriverRequest {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub status: Option<DriverStatus>,
    /// Existing login to link; that user becomes a driver.
    pub user_id: Option<Uuid>,
    pub vehicle: Option<VehicleInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetDriverStatusRequest {
    pub status: DriverStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DriverList {
    pub items: Vec<Driver>,
}
