use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit::record_audit,
    dto::drivers::{DriverList, SaveDriverRequest, SetDriverStatusRequest, VehicleInput},
    entity::{
        Drivers, Users, Vehicles,
        drivers::{ActiveModel as DriverActive, Column as DriverCol},
        users::ActiveModel as UserActive,
        vehicles::{ActiveModel as VehicleActive, Column as VehicleCol},
    },
    error::{AppError, AppResult, required},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Driver, Role},
    response::{ApiResponse, Meta},
    state::AppState,
};

const NEW_DRIVER_RATING: f64 = 5.0;

pub async fn list_drivers(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DriverList>> {
    ensure_admin(user)?;

    let items = Drivers::find()
        .find_also_related(Vehicles)
        .order_by_asc(DriverCol::FullName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(driver, vehicle)| Driver::from_entity(driver, vehicle))
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Ok", DriverList { items }, Some(meta)))
}

pub async fn get_driver(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Driver>> {
    ensure_admin(user)?;
    let (driver, vehicle) = Drivers::find_by_id(id)
        .find_also_related(Vehicles)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("driver"))?;
    Ok(ApiResponse::success(
        "Driver",
        Driver::from_entity(driver, vehicle)?,
        Some(Meta::empty()),
    ))
}

/// Creates the driver when `id` is `None`, otherwise updates it. The vehicle,
/// when given, replaces the driver's single vehicle.
pub async fn save_driver(
    state: &AppState,
    user: &AuthUser,
    id: Option<Uuid>,
    payload: SaveDriverRequest,
    now: DateTime<Utc>,
) -> AppResult<ApiResponse<Driver>> {
    ensure_admin(user)?;
    let full_name = required("full_name", &payload.full_name)?;
    let phone = required("phone", &payload.phone)?;
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string);
    if email.as_deref().is_some_and(|email| !email.contains('@')) {
        return Err(AppError::validation("email must be a valid address"));
    }
    if let Some(vehicle) = &payload.vehicle {
        validate_vehicle(vehicle)?;
    }

    let txn = state.orm.begin().await?;

    if let Some(user_id) = payload.user_id {
        let linked = Users::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("user"))?;
        if linked.role == Role::Admin.as_str() {
            return Err(AppError::validation(
                "an admin account cannot be linked to a driver",
            ));
        }
        if linked.role != Role::Driver.as_str() {
            let mut active: UserActive = linked.into();
            active.role = Set(Role::Driver.as_str().to_string());
            active.update(&txn).await?;
        }
    }

    let driver = match id {
        Some(id) => {
            let existing = Drivers::find_by_id(id)
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or(AppError::NotFound("driver"))?;
            let mut active: DriverActive = existing.into();
            active.full_name = Set(full_name);
            active.phone = Set(phone);
            active.email = Set(email);
            if let Some(status) = payload.status {
                active.status = Set(status.as_str().to_string());
            }
            if payload.user_id.is_some() {
                active.user_id = Set(payload.user_id);
            }
            active.update(&txn).await?
        }
        None => {
            DriverActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(payload.user_id),
                full_name: Set(full_name),
                phone: Set(phone),
                email: Set(email),
                status: Set(payload.status.unwrap_or_default().as_str().to_string()),
                rating: Set(NEW_DRIVER_RATING),
                total_trips: Set(0),
                created_at: Set(now.fixed_offset()),
            }
            .insert(&txn)
            .await?
        }
    };

    let existing_vehicle = Vehicles::find()
        .filter(VehicleCol::DriverId.eq(driver.id))
        .one(&txn)
        .await?;
    let vehicle = match (payload.vehicle, existing_vehicle) {
        (Some(input), Some(current)) => {
            let mut active: VehicleActive = current.into();
            active.make = Set(input.make.trim().to_string());
            active.model = Set(input.model.trim().to_string());
            active.color = Set(input.color.trim().to_string());
            active.plate_number = Set(input.plate_number.trim().to_uppercase());
            Some(active.update(&txn).await?)
        }
        (Some(input), None) => Some(
            VehicleActive {
                id: Set(Uuid::new_v4()),
                driver_id: Set(driver.id),
                make: Set(input.make.trim().to_string()),
                model: Set(input.model.trim().to_string()),
                color: Set(input.color.trim().to_string()),
                plate_number: Set(input.plate_number.trim().to_uppercase()),
            }
            .insert(&txn)
            .await?,
        ),
        (None, current) => current,
    };

    txn.commit().await?;

    record_audit(
        &state.orm,
        Some(user.user_id),
        "driver_save",
        "drivers",
        serde_json::json!({
            "driver_id": driver.id,
            "created": id.is_none(),
            "vehicle_id": vehicle.as_ref().map(|vehicle| vehicle.id),
        }),
    )
    .await;
    tracing::info!(driver_id = %driver.id, created = id.is_none(), "driver saved");

    let message = if id.is_some() { "Driver updated" } else { "Driver created" };
    Ok(ApiResponse::success(
        message,
        Driver::from_entity(driver, vehicle)?,
        Some(Meta::empty()),
    ))
}

pub async fn set_driver_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetDriverStatusRequest,
) -> AppResult<ApiResponse<Driver>> {
    ensure_admin(user)?;
    let existing = Drivers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("driver"))?;

    let mut active: DriverActive = existing.into();
    active.status = Set(payload.status.as_str().to_string());
    let driver = active.update(&state.orm).await?;

    let vehicle = Vehicles::find()
        .filter(VehicleCol::DriverId.eq(driver.id))
        .one(&state.orm)
        .await?;

    record_audit(
        &state.orm,
        Some(user.user_id),
        "driver_status",
        "drivers",
        serde_json::json!({ "driver_id": id, "status": payload.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Driver status updated",
        Driver::from_entity(driver, vehicle)?,
        Some(Meta::empty()),
    ))
}

fn validate_vehicle(vehicle: &VehicleInput) -> AppResult<()> {
    for (field, value) in [
        ("vehicle.make", &vehicle.make),
        ("vehicle.model", &vehicle.model),
        ("vehicle.color", &vehicle.color),
        ("vehicle.plate_number", &vehicle.plate_number),
    ] {
        required(field, value)?;
    }
    Ok(())
}
