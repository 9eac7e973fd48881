use argon2::{
    Argon2, PasswordHasher,
    password_hash::{rand_core::OsRng, SaltString},
};
use chrono::Utc;
use ride_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        Clients, Drivers, Users, Vehicles,
        clients::{self, Column as ClientCol},
        drivers::{self, Column as DriverCol},
        users::{self, Column as UserCol},
        vehicles::{self, Column as VehicleCol},
    },
    models::{DriverStatus, Role},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use uuid::Uuid;

const DEMO_CLIENT_ID: &str = "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11";
const DEMO_DRIVER_ID: &str = "d2c94382-7a0e-4f10-bf61-39049774641e";
const DEMO_VEHICLE_ID: &str = "b0eebc99-9c0b-4ef8-bb6d-6bb9bd380a22";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin12345".to_string());
    let admin_id = ensure_admin(&orm, "admin@example.com", &admin_password).await?;
    let client_id = seed_client(&orm).await?;
    let driver_id = seed_driver(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, Client ID: {client_id}, Driver ID: {driver_id}");
    Ok(())
}

async fn ensure_admin(orm: &DatabaseConnection, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    Users::insert(users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some(password_hash)),
        role: Set(Role::Admin.as_str().to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    })
    .on_conflict(
        OnConflict::column(UserCol::Email)
            .update_column(UserCol::Role)
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    // If user already exists, fetch id
    let admin = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("admin {email} missing after upsert"))?;

    println!("Ensured user {email} (role=admin)");
    Ok(admin.id)
}

async fn seed_client(orm: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let id = Uuid::parse_str(DEMO_CLIENT_ID)?;
    Clients::insert(clients::ActiveModel {
        id: Set(id),
        user_id: Set(None),
        full_name: Set("James".to_string()),
        phone: Set("+1 555 0123 4567".to_string()),
        email: Set("james@vip.com".to_string()),
        is_guest: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
    })
    .on_conflict(
        OnConflict::column(ClientCol::Id)
            .update_columns([ClientCol::FullName, ClientCol::Phone, ClientCol::Email])
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    println!("Seeded client");
    Ok(id)
}

async fn seed_driver(orm: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let driver_id = Uuid::parse_str(DEMO_DRIVER_ID)?;
    Drivers::insert(drivers::ActiveModel {
        id: Set(driver_id),
        user_id: Set(None),
        full_name: Set("James Anderson".to_string()),
        phone: Set("+1 555 9876 5432".to_string()),
        email: Set(None),
        status: Set(DriverStatus::Active.as_str().to_string()),
        rating: Set(5.0),
        total_trips: Set(0),
        created_at: Set(Utc::now().fixed_offset()),
    })
    .on_conflict(
        OnConflict::column(DriverCol::Id)
            .update_columns([DriverCol::FullName, DriverCol::Phone, DriverCol::Status])
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    Vehicles::insert(vehicles::ActiveModel {
        id: Set(Uuid::parse_str(DEMO_VEHICLE_ID)?),
        driver_id: Set(driver_id),
        make: Set("Mercedes-Benz".to_string()),
        model: Set("S-Class".to_string()),
        color: Set("Black".to_string()),
        plate_number: Set("LUX-555".to_string()),
    })
    .on_conflict(
        OnConflict::column(VehicleCol::Id)
            .update_columns([
                VehicleCol::Make,
                VehicleCol::Model,
                VehicleCol::Color,
                VehicleCol::PlateNumber,
            ])
            .to_owned(),
    )
    .exec_without_returning(orm)
    .await?;

    println!("Seeded driver and vehicle");
    Ok(driver_id)
}
