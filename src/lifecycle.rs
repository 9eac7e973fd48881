//! Booking state machine.
//!
//! ```text
//! requested --confirm--> confirmed --start_trip--> on_the_way --complete--> completed
//!     |                      |                         |
//!     +--reject/cancel-------+---------cancel----------+-----------------> cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal. Completion is only accepted from
//! `on_the_way`, so every finished ride went through a started trip.

use std::fmt;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Confirm,
    Reject,
    Cancel,
    StartTrip,
    Complete,
    AssignDriver,
}

impl BookingAction {
    /// Name used for the audit trail.
    pub fn audit_name(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "booking_confirm",
            BookingAction::Reject => "booking_reject",
            BookingAction::Cancel => "booking_cancel",
            BookingAction::StartTrip => "booking_start_trip",
            BookingAction::Complete => "booking_complete",
            BookingAction::AssignDriver => "booking_assign_driver",
        }
    }
}

impl fmt::Display for BookingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Reject => "reject",
            BookingAction::Cancel => "cancel",
            BookingAction::StartTrip => "start",
            BookingAction::Complete => "complete",
            BookingAction::AssignDriver => "assign a driver to",
        };
        f.write_str(verb)
    }
}

/// Status a booking moves to when `action` is applied in status `from`.
///
/// Driver assignment keeps the current status.
pub fn transition(from: BookingStatus, action: BookingAction) -> Result<BookingStatus, AppError> {
    use BookingAction as A;
    use BookingStatus as S;

    let next = match (from, action) {
        (S::Requested, A::Confirm) => S::Confirmed,
        (S::Requested, A::Reject) => S::Cancelled,
        (S::Requested | S::Confirmed | S::OnTheWay, A::Cancel) => S::Cancelled,
        (S::Confirmed, A::StartTrip) => S::OnTheWay,
        (S::OnTheWay, A::Complete) => S::Completed,
        (S::Requested | S::Confirmed, A::AssignDriver) => from,
        _ => return Err(AppError::InvalidTransition { from, action }),
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [BookingStatus; 5] = [
        BookingStatus::Requested,
        BookingStatus::Confirmed,
        BookingStatus::OnTheWay,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    const ALL_ACTIONS: [BookingAction; 6] = [
        BookingAction::Confirm,
        BookingAction::Reject,
        BookingAction::Cancel,
        BookingAction::StartTrip,
        BookingAction::Complete,
        BookingAction::AssignDriver,
    ];

    #[test]
    fn happy_path_reaches_completed() {
        let mut status = BookingStatus::Requested;
        for action in [
            BookingAction::AssignDriver,
            BookingAction::Confirm,
            BookingAction::StartTrip,
            BookingAction::Complete,
        ] {
            status = transition(status, action).expect("valid step");
        }
        assert_eq!(status, BookingStatus::Completed);
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for from in ALL_STATUSES.into_iter().filter(BookingStatus::is_terminal) {
            for action in ALL_ACTIONS {
                assert!(
                    matches!(
                        transition(from, action),
                        Err(AppError::InvalidTransition { .. })
                    ),
                    "{action} from {from} should be rejected"
                );
            }
        }
    }

    #[test]
    fn cancel_is_allowed_from_every_open_state() {
        for from in ALL_STATUSES.into_iter().filter(|s| !s.is_terminal()) {
            assert_eq!(
                transition(from, BookingAction::Cancel).ok(),
                Some(BookingStatus::Cancelled)
            );
        }
    }

    #[test]
    fn confirm_and_reject_need_requested() {
        assert_eq!(
            transition(BookingStatus::Requested, BookingAction::Reject).ok(),
            Some(BookingStatus::Cancelled)
        );
        for from in [BookingStatus::Confirmed, BookingStatus::OnTheWay] {
            assert!(transition(from, BookingAction::Confirm).is_err());
            assert!(transition(from, BookingAction::Reject).is_err());
        }
    }

    #[test]
    fn completion_requires_a_started_trip() {
        assert!(transition(BookingStatus::Confirmed, BookingAction::Complete).is_err());
        assert!(transition(BookingStatus::Requested, BookingAction::StartTrip).is_err());
    }

    #[test]
    fn driver_can_only_be_assigned_before_the_trip() {
        assert_eq!(
            transition(BookingStatus::Confirmed, BookingAction::AssignDriver).ok(),
            Some(BookingStatus::Confirmed)
        );
        assert!(transition(BookingStatus::OnTheWay, BookingAction::AssignDriver).is_err());
    }
}
