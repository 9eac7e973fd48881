mod common;

use chrono::{Duration, Utc};
use common::{admin, client, driver, in_hours, ride, setup_state};
use ride_booking_api::{
    dto::drivers::{SaveDriverRequest, SetDriverStatusRequest, VehicleInput},
    error::AppError,
    models::{DriverStatus, Role},
    routes::params::RosterQuery,
    entity::Users,
    services::{admin_service, booking_service, driver_service, roster::RosterSort},
};
use sea_orm::EntityTrait;
use uuid::Uuid;

#[tokio::test]
async fn roster_counts_completed_rides_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (maria, maria_id) = client(&state, "Maria Lopez", false).await?;
    let (tom, tom_id) = client(&state, "Tom Baker", false).await?;
    let (_, amy_id) = client(&state, "Amy Chen", false).await?;
    let (_, driver_id) = driver(&state, DriverStatus::Active).await?;
    let now = Utc::now();

    // Two completed rides for Maria, one cancelled ride for Tom.
    for hours in [2, 5] {
        let booking = booking_service::request_ride(&state, &maria, ride("SFO", "Union Square", in_hours(hours)), now)
            .await?
            .into_data()
            .expect("booking");
        booking_service::confirm_booking(&state, &admin, booking.id, now).await?;
        booking_service::assign_driver(&state, &admin, booking.id, driver_id, now).await?;
        booking_service::start_trip(&state, &admin, booking.id, now).await?;
        booking_service::complete_booking(&state, &admin, booking.id, now).await?;
    }
    let cancelled = booking_service::request_ride(&state, &tom, ride("SFO", "Berkeley", in_hours(8)), now)
        .await?
        .into_data()
        .expect("booking");
    booking_service::cancel_booking(&state, &tom, cancelled.id, now).await?;

    let by_spend = admin_service::client_roster(
        &state,
        &admin,
        RosterQuery {
            sort: Some(RosterSort::Spend),
        },
    )
    .await?
    .into_data()
    .expect("roster")
    .items;

    let ids: Vec<Uuid> = by_spend.iter().map(|entry| entry.client.id).collect();
    assert_eq!(ids[0], maria_id);

    let maria_entry = &by_spend[0];
    assert_eq!(maria_entry.total_rides, 2);
    assert_eq!(maria_entry.total_spend, 140);
    assert!(!maria_entry.is_vip);

    let tom_entry = by_spend.iter().find(|entry| entry.client.id == tom_id).expect("tom");
    assert_eq!(tom_entry.total_rides, 0);
    assert_eq!(tom_entry.total_spend, 0);
    // Cancelled rides still count as the latest ride date.
    assert!(tom_entry.last_ride_at.is_some());

    let amy_entry = by_spend.iter().find(|entry| entry.client.id == amy_id).expect("amy");
    assert!(amy_entry.last_ride_at.is_none());

    let by_name = admin_service::client_roster(&state, &admin, RosterQuery::default())
        .await?
        .into_data()
        .expect("roster")
        .items;
    let names: Vec<&str> = by_name.iter().map(|entry| entry.client.full_name.as_str()).collect();
    assert_eq!(names, ["Amy Chen", "Maria Lopez", "Tom Baker"]);

    let detail = admin_service::client_detail(&state, &admin, maria_id)
        .await?
        .into_data()
        .expect("detail");
    assert_eq!(detail.summary.total_spend, 140);
    assert_eq!(detail.bookings.len(), 2);
    assert!(detail.bookings[0].pickup_datetime > detail.bookings[1].pickup_datetime);
    Ok(())
}

#[tokio::test]
async fn roster_and_stats_are_admin_only() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let (user, client_id) = client(&state, "Maria Lopez", false).await?;

    let err = admin_service::client_roster(&state, &user, RosterQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = admin_service::client_detail(&state, &user, client_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = admin_service::admin_stats(&state, &user, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn stats_count_today_and_pending() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (user, _) = client(&state, "Maria Lopez", false).await?;

    // Noon keeps every pickup below inside or outside the day whatever the clock says.
    let noon = Utc::now()
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .expect("noon")
        .and_utc();

    let today = booking_service::request_ride(&state, &user, ride("A", "B", noon + Duration::hours(1)), noon)
        .await?
        .into_data()
        .expect("booking");
    booking_service::request_ride(&state, &user, ride("A", "B", noon + Duration::hours(2)), noon).await?;
    booking_service::request_ride(&state, &user, ride("A", "B", noon + Duration::days(2)), noon).await?;
    booking_service::confirm_booking(&state, &admin, today.id, noon).await?;

    let stats = admin_service::admin_stats(&state, &admin, noon)
        .await?
        .into_data()
        .expect("stats");
    assert_eq!(stats.today_count, 2);
    assert_eq!(stats.requested_count, 2);
    Ok(())
}

#[tokio::test]
async fn drivers_are_saved_with_their_vehicle() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let login = common::create_user(&state, Role::Client).await?;
    let now = Utc::now();

    let payload = SaveDriverRequest {
        full_name: "James Anderson".into(),
        phone: "+1 555 9876 5432".into(),
        email: None,
        status: Some(DriverStatus::Active),
        user_id: Some(login.user_id),
        vehicle: Some(VehicleInput {
            make: "Mercedes-Benz".into(),
            model: "S-Class".into(),
            color: "Black".into(),
            plate_number: "lux-555".into(),
        }),
    };

    let created = driver_service::save_driver(&state, &admin, None, payload.clone(), now)
        .await?
        .into_data()
        .expect("driver");
    assert_eq!(created.rating, 5.0);
    assert_eq!(created.total_trips, 0);
    let vehicle = created.vehicle.clone().expect("vehicle");
    assert_eq!(vehicle.plate_number, "LUX-555");

    let mut update = payload;
    update.vehicle = Some(VehicleInput {
        make: "BMW".into(),
        model: "7 Series".into(),
        color: "Silver".into(),
        plate_number: "LUX-777".into(),
    });
    let updated = driver_service::save_driver(&state, &admin, Some(created.id), update, now)
        .await?
        .into_data()
        .expect("driver");
    let new_vehicle = updated.vehicle.expect("vehicle");
    assert_eq!(new_vehicle.id, vehicle.id);
    assert_eq!(new_vehicle.make, "BMW");

    let inactive = driver_service::set_driver_status(
        &state,
        &admin,
        created.id,
        SetDriverStatusRequest {
            status: DriverStatus::Inactive,
        },
    )
    .await?
    .into_data()
    .expect("driver");
    assert_eq!(inactive.status, DriverStatus::Inactive);

    let listed = driver_service::list_drivers(&state, &admin)
        .await?
        .into_data()
        .expect("drivers");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].vehicle.as_ref().map(|v| v.make.as_str()), Some("BMW"));

    let err = driver_service::get_driver(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("driver")));

    let err = driver_service::list_drivers(&state, &login).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn admin_accounts_cannot_become_drivers() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let other_admin = common::create_user(&state, Role::Admin).await?;

    let payload = SaveDriverRequest {
        full_name: "James Anderson".into(),
        phone: "+1 555 9876 5432".into(),
        email: None,
        status: None,
        user_id: Some(other_admin.user_id),
        vehicle: None,
    };
    let err = driver_service::save_driver(&state, &admin, None, payload, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let account = Users::find_by_id(other_admin.user_id)
        .one(&state.orm)
        .await?
        .expect("user");
    assert_eq!(account.role, Role::Admin.as_str());

    let listed = driver_service::list_drivers(&state, &admin)
        .await?
        .into_data()
        .expect("drivers");
    assert!(listed.items.is_empty());
    Ok(())
}
