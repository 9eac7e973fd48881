mod common;

use chrono::{Duration, Utc};
use common::{admin, client, driver, in_hours, ride, setup_state};
use ride_booking_api::{
    dto::{bookings::AdminCreateBookingRequest, clients::UpdateProfileRequest},
    entity::{AuditLogs, Drivers},
    error::AppError,
    models::{BookingStatus, DriverStatus},
    realtime::shallow_merge,
    routes::params::BookingListQuery,
    services::{auth_service, booking_service, client_service},
};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn registered_client_books_and_admin_confirms() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (user, client_id) = client(&state, "Maria Lopez", false).await?;

    let booking = booking_service::request_ride(
        &state,
        &user,
        ride("SFO Terminal 2", "Union Square", in_hours(4)),
        Utc::now(),
    )
    .await?
    .into_data()
    .expect("booking");

    assert_eq!(booking.client_id, client_id);
    assert_eq!(booking.status, BookingStatus::Requested);
    assert_eq!((booking.estimated_fare_min, booking.estimated_fare_max), (70, 86));
    assert!(booking.driver_id.is_none());

    let confirmed = booking_service::confirm_booking(&state, &admin, booking.id, Utc::now())
        .await?
        .into_data()
        .expect("booking");
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let err = booking_service::confirm_booking(&state, &admin, booking.id, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Confirmed,
            ..
        }
    ));

    // request + confirm
    assert_eq!(AuditLogs::find().count(&state.orm).await?, 2);
    Ok(())
}

#[tokio::test]
async fn blank_pickup_is_rejected_before_anything_is_written() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let (user, _) = client(&state, "Maria Lopez", false).await?;

    let err = booking_service::request_ride(&state, &user, ride("  ", "Union Square", in_hours(2)), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        ride_booking_api::entity::Bookings::find().count(&state.orm).await?,
        0
    );
    Ok(())
}

#[tokio::test]
async fn guest_must_complete_profile_and_stays_within_quota() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let session = auth_service::guest_sign_in(&state, Utc::now())
        .await?
        .into_data()
        .expect("session");
    let guest = ride_booking_api::middleware::auth::decode_token(&state.config, &session.token)?;

    let err = booking_service::request_ride(&state, &guest, ride("Pier 39", "SFO", in_hours(3)), Utc::now())
        .await
        .unwrap_err();
    match err {
        AppError::IncompleteGuestProfile { missing } => {
            assert_eq!(missing, vec!["full_name", "phone", "email"]);
        }
        other => panic!("expected incomplete profile, got {other:?}"),
    }

    client_service::update_my_profile(
        &state,
        &guest,
        UpdateProfileRequest {
            full_name: Some("Ana Silva".into()),
            phone: Some("+1 555 0199".into()),
            email: Some("ana@example.com".into()),
        },
    )
    .await?;

    let mut booked = Vec::new();
    for _ in 0..3 {
        let booking = booking_service::request_ride(&state, &guest, ride("Pier 39", "SFO", in_hours(3)), Utc::now())
            .await?
            .into_data()
            .expect("booking");
        booked.push(booking.id);
    }

    // Cancelled bookings still count toward the quota.
    booking_service::cancel_booking(&state, &guest, booked[0], Utc::now()).await?;

    let err = booking_service::request_ride(&state, &guest, ride("Pier 39", "SFO", in_hours(3)), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GuestQuotaExceeded { limit: 3 }));

    // Dispatchers booking on the guest's behalf hit the same gate.
    let client_id = session.client.expect("guest client").id;
    let err = booking_service::admin_create_booking(
        &state,
        &admin,
        AdminCreateBookingRequest {
            client_id,
            ride: ride("Pier 39", "SFO", in_hours(3)),
        },
        Utc::now(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::GuestQuotaExceeded { .. }));
    Ok(())
}

#[tokio::test]
async fn late_cancellation_is_charged_and_early_is_free() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let (user, _) = client(&state, "Maria Lopez", false).await?;
    let now = Utc::now();

    let soon = booking_service::request_ride(&state, &user, ride("A", "B", now + Duration::minutes(30)), now)
        .await?
        .into_data()
        .expect("booking");
    let later = booking_service::request_ride(&state, &user, ride("A", "B", now + Duration::hours(3)), now)
        .await?
        .into_data()
        .expect("booking");

    let receipt = booking_service::cancel_booking(&state, &user, soon.id, now)
        .await?
        .into_data()
        .expect("receipt");
    assert_eq!(receipt.fee, 7);
    assert_eq!(receipt.booking.status, BookingStatus::Cancelled);
    assert_eq!(receipt.booking.cancellation_fee, Some(7));

    let receipt = booking_service::cancel_booking(&state, &user, later.id, now)
        .await?
        .into_data()
        .expect("receipt");
    assert_eq!(receipt.fee, 0);

    let err = booking_service::cancel_booking(&state, &user, later.id, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Cancelled,
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn trip_runs_from_assignment_to_completion() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (rider, _) = client(&state, "Maria Lopez", false).await?;
    let (driver_user, driver_id) = driver(&state, DriverStatus::Active).await?;
    let (_, idle_driver_id) = driver(&state, DriverStatus::Inactive).await?;
    let now = Utc::now();

    let booking = booking_service::request_ride(&state, &rider, ride("SFO", "Palo Alto", in_hours(5)), now)
        .await?
        .into_data()
        .expect("booking");

    let err = booking_service::assign_driver(&state, &admin, booking.id, idle_driver_id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = booking_service::assign_driver(&state, &admin, booking.id, Uuid::new_v4(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("driver")));

    booking_service::confirm_booking(&state, &admin, booking.id, now).await?;

    // Completion needs a started trip.
    let err = booking_service::complete_booking(&state, &admin, booking.id, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Confirmed,
            ..
        }
    ));

    let err = booking_service::start_trip(&state, &admin, booking.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let assigned = booking_service::assign_driver(&state, &admin, booking.id, driver_id, now)
        .await?
        .into_data()
        .expect("booking");
    assert_eq!(assigned.driver_id, Some(driver_id));
    assert_eq!(assigned.status, BookingStatus::Confirmed);

    let started = booking_service::start_trip(&state, &driver_user, booking.id, now)
        .await?
        .into_data()
        .expect("booking");
    assert_eq!(started.status, BookingStatus::OnTheWay);

    let err = booking_service::assign_driver(&state, &admin, booking.id, driver_id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let completed = booking_service::complete_booking(&state, &driver_user, booking.id, now)
        .await?
        .into_data()
        .expect("booking");
    assert_eq!(completed.status, BookingStatus::Completed);

    let driver = Drivers::find_by_id(driver_id).one(&state.orm).await?.expect("driver");
    assert_eq!(driver.total_trips, 1);

    let err = booking_service::cancel_booking(&state, &rider, booking.id, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Completed,
            ..
        }
    ));

    let detail = booking_service::get_booking(&state, &rider, booking.id)
        .await?
        .into_data()
        .expect("detail");
    assert_eq!(detail.driver.map(|driver| driver.id), Some(driver_id));
    assert_eq!(detail.client.full_name, "Maria Lopez");
    Ok(())
}

#[tokio::test]
async fn callers_only_touch_what_they_own() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let (owner, _) = client(&state, "Maria Lopez", false).await?;
    let (stranger, _) = client(&state, "Tom Baker", false).await?;
    let (driver_user, _) = driver(&state, DriverStatus::Active).await?;
    let now = Utc::now();

    let booking = booking_service::request_ride(&state, &owner, ride("A", "B", in_hours(2)), now)
        .await?
        .into_data()
        .expect("booking");

    for err in [
        booking_service::confirm_booking(&state, &owner, booking.id, now).await.unwrap_err(),
        booking_service::cancel_booking(&state, &stranger, booking.id, now)
            .await
            .map(|_| ())
            .unwrap_err(),
        booking_service::start_trip(&state, &driver_user, booking.id, now)
            .await
            .map(|_| ())
            .unwrap_err(),
        booking_service::get_booking(&state, &stranger, booking.id)
            .await
            .map(|_| ())
            .unwrap_err(),
    ] {
        assert!(matches!(err, AppError::Forbidden), "got {err:?}");
    }

    let err = booking_service::confirm_booking(&state, &owner, Uuid::new_v4(), now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("booking")));
    Ok(())
}

#[tokio::test]
async fn list_filters_by_text_status_and_owner() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (maria, _) = client(&state, "Maria Lopez", false).await?;
    let (tom, _) = client(&state, "Tom Baker", false).await?;
    let now = Utc::now();

    let first = booking_service::request_ride(&state, &maria, ride("SFO Terminal 2", "Union Square", in_hours(2)), now)
        .await?
        .into_data()
        .expect("booking");
    booking_service::request_ride(&state, &tom, ride("Oakland Airport", "Berkeley", in_hours(1)), now).await?;
    booking_service::request_ride(&state, &tom, ride("Ferry Building", "Sausalito", in_hours(3)), now).await?;
    booking_service::confirm_booking(&state, &admin, first.id, now).await?;

    let search = |q: &str| BookingListQuery {
        q: Some(q.to_string()),
        ..Default::default()
    };

    let by_name = booking_service::list_bookings(&state, &admin, search("maria"))
        .await?
        .into_data()
        .expect("list");
    assert_eq!(by_name.items.len(), 1);
    assert_eq!(by_name.items[0].client_name.as_deref(), Some("Maria Lopez"));

    let by_address = booking_service::list_bookings(&state, &admin, search("AIRPORT"))
        .await?
        .into_data()
        .expect("list");
    assert_eq!(by_address.items.len(), 1);
    assert_eq!(by_address.items[0].booking.pickup_address, "Oakland Airport");

    let by_dropoff = booking_service::list_bookings(&state, &admin, search("sausalito"))
        .await?
        .into_data()
        .expect("list");
    assert_eq!(by_dropoff.items.len(), 1);

    let requested = booking_service::list_bookings(
        &state,
        &admin,
        BookingListQuery {
            status: Some(BookingStatus::Requested),
            ..Default::default()
        },
    )
    .await?;
    let meta = requested.meta.clone().expect("meta");
    let items = requested.into_data().expect("list").items;
    assert_eq!(meta.total, Some(2));
    // Ordered by pickup time, earliest first.
    assert_eq!(items[0].booking.pickup_address, "Oakland Airport");
    assert_eq!(items[1].booking.pickup_address, "Ferry Building");

    let own = booking_service::list_bookings(&state, &tom, BookingListQuery::default())
        .await?
        .into_data()
        .expect("list");
    assert_eq!(own.items.len(), 2);
    assert!(own.items.iter().all(|item| item.client_name.as_deref() == Some("Tom Baker")));

    let window = booking_service::list_bookings(
        &state,
        &admin,
        BookingListQuery {
            from: Some(now + Duration::minutes(90)),
            to: Some(now + Duration::minutes(150)),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("list");
    assert_eq!(window.items.len(), 1);
    assert_eq!(window.items[0].booking.id, first.id);
    Ok(())
}

#[tokio::test]
async fn search_matches_literal_text_in_any_case() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (maria, _) = client(&state, "Maria Lopez", false).await?;
    let (angela, _) = client(&state, "ÁNGELA Ruiz", false).await?;
    let now = Utc::now();

    booking_service::request_ride(&state, &maria, ride("SFO Terminal 2", "Union Square", in_hours(2)), now).await?;
    booking_service::request_ride(&state, &angela, ride("Oakland", "Berkeley", in_hours(3)), now).await?;
    booking_service::request_ride(&state, &maria, ride("100% Organic Café", "Mission", in_hours(4)), now).await?;

    let hits = |q: &str| {
        let state = state.clone();
        let admin = admin.clone();
        let query = BookingListQuery {
            q: Some(q.to_string()),
            ..Default::default()
        };
        async move {
            let list = booking_service::list_bookings(&state, &admin, query)
                .await?
                .into_data()
                .expect("list");
            anyhow::Ok(list.items.len())
        }
    };

    assert_eq!(hits("_").await?, 0);
    assert_eq!(hits("s_o").await?, 0);
    assert_eq!(hits("100%").await?, 1);
    assert_eq!(hits("% organic").await?, 1);
    assert_eq!(hits("ángela").await?, 1);
    assert_eq!(hits("CAFÉ").await?, 1);
    assert_eq!(hits("nowhere").await?, 0);
    Ok(())
}

#[tokio::test]
async fn reject_only_applies_to_requested_bookings() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (user, _) = client(&state, "Maria Lopez", false).await?;
    let now = Utc::now();

    let first = booking_service::request_ride(&state, &user, ride("SFO Terminal 2", "Union Square", in_hours(1)), now)
        .await?
        .into_data()
        .expect("booking");
    let rejected = booking_service::reject_booking(&state, &admin, first.id, now)
        .await?
        .into_data()
        .expect("booking");
    assert_eq!(rejected.status, BookingStatus::Cancelled);
    assert_eq!(rejected.cancellation_fee, None);

    let err = booking_service::reject_booking(&state, &admin, first.id, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Cancelled,
            ..
        }
    ));

    let second = booking_service::request_ride(&state, &user, ride("Oakland", "Berkeley", in_hours(5)), now)
        .await?
        .into_data()
        .expect("booking");
    booking_service::confirm_booking(&state, &admin, second.id, now).await?;
    let err = booking_service::reject_booking(&state, &admin, second.id, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: BookingStatus::Confirmed,
            ..
        }
    ));

    let err = booking_service::reject_booking(&state, &user, second.id, now)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn subscribers_receive_partial_changes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = admin(&state).await?;
    let (user, _) = client(&state, "Maria Lopez", false).await?;
    let now = Utc::now();

    let booking = booking_service::request_ride(&state, &user, ride("A", "B", in_hours(2)), now)
        .await?
        .into_data()
        .expect("booking");
    let mut subscription = state.feed.subscribe(booking.id);

    booking_service::confirm_booking(&state, &admin, booking.id, now).await?;

    let change = subscription.next().await.expect("change");
    assert_eq!(change.booking_id, booking.id);
    assert_eq!(change.changes["status"], "confirmed");
    assert!(!change.changes.contains_key("pickup_address"));

    let serde_json::Value::Object(mut local) = serde_json::to_value(&booking)? else {
        panic!("booking serializes to an object");
    };
    shallow_merge(&mut local, &change.changes);
    assert_eq!(local["status"], "confirmed");
    assert_eq!(local["pickup_address"], "A");
    Ok(())
}
