use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        advice::{AdviceRequest, AdviceResponse},
        auth::{AuthSession, ChangePasswordRequest, CurrentUserResponse, SignInRequest, SignUpRequest},
        bookings::{
            AdminCreateBookingRequest, AssignDriverRequest, BookingDetail, BookingList,
            BookingSummary, CancellationReceipt, FareQuoteRequest, RequestRideRequest,
        },
        clients::{AdminStats, ClientDetail, ClientRoster, UpdateProfileRequest},
        drivers::{DriverList, SaveDriverRequest, SetDriverStatusRequest, VehicleInput},
    },
    models::{
        Booking, BookingStatus, Client, Driver, DriverStatus, PaymentMethod, PaymentStatus, Role,
        TripType, User, Vehicle,
    },
    realtime::BookingChange,
    response::{ApiResponse, Meta},
    routes::{admin, advice, auth, bookings, clients, drivers, fares, health, params},
    services::{
        fare::FareEstimate,
        roster::{ClientRosterEntry, RosterSort},
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::sign_up,
        auth::sign_in,
        auth::guest_sign_in,
        auth::change_password,
        auth::current_user,
        clients::get_my_profile,
        clients::update_my_profile,
        bookings::list_bookings,
        bookings::request_ride,
        bookings::get_booking,
        bookings::confirm_booking,
        bookings::reject_booking,
        bookings::cancel_booking,
        bookings::start_trip,
        bookings::complete_booking,
        bookings::assign_driver,
        fares::quote_fare,
        drivers::list_drivers,
        drivers::get_driver,
        drivers::create_driver,
        drivers::update_driver,
        drivers::set_driver_status,
        admin::admin_stats,
        admin::client_roster,
        admin::client_detail,
        admin::admin_create_booking,
        advice::ask_concierge
    ),
    components(
        schemas(
            User,
            Role,
            Client,
            Driver,
            DriverStatus,
            Vehicle,
            Booking,
            BookingStatus,
            PaymentMethod,
            PaymentStatus,
            TripType,
            BookingChange,
            SignUpRequest,
            SignInRequest,
            ChangePasswordRequest,
            AuthSession,
            CurrentUserResponse,
            UpdateProfileRequest,
            RequestRideRequest,
            AdminCreateBookingRequest,
            AssignDriverRequest,
            CancellationReceipt,
            BookingDetail,
            BookingSummary,
            BookingList,
            FareQuoteRequest,
            FareEstimate,
            SaveDriverRequest,
            SetDriverStatusRequest,
            VehicleInput,
            DriverList,
            ClientRosterEntry,
            RosterSort,
            ClientRoster,
            ClientDetail,
            AdminStats,
            AdviceRequest,
            AdviceResponse,
            params::Pagination,
            params::BookingListQuery,
            params::RosterQuery,
            Meta,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<BookingDetail>,
            ApiResponse<ClientRoster>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Sign-up, sign-in and guest sessions"),
        (name = "Clients", description = "Client profile endpoints"),
        (name = "Bookings", description = "Ride booking lifecycle"),
        (name = "Fares", description = "Fare estimates"),
        (name = "Drivers", description = "Driver and vehicle management"),
        (name = "Admin", description = "Dispatcher endpoints"),
        (name = "Advice", description = "Travel concierge answers"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_the_booking_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/bookings",
            "/api/bookings/{id}/cancel",
            "/api/admin/clients",
            "/api/fares/quote",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
