pub mod audit_logs;
pub mod bookings;
pub mod clients;
pub mod drivers;
pub mod users;
pub mod vehicles;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use clients::Entity as Clients;
pub use drivers::Entity as Drivers;
pub use users::Entity as Users;
pub use vehicles::Entity as Vehicles;
