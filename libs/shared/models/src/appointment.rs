use serde::{Deserialize, Serialize};
use std::fmt;

/// Appointment status as stored and exchanged on the wire.
///
/// `Requested` is the only initial state; `Rejected`, `Completed` and
/// `Cancelled` are terminal. Transitions are validated by the scheduling
/// lifecycle table, never by string comparison at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Rejected,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Rejected
                | AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
        )
    }

    /// Cancelled appointments release their slot; everything else keeps
    /// the (doctor, scheduled_at) pair occupied.
    pub fn occupies_slot(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }

    /// Report uploads are only eligible against these statuses.
    pub fn accepts_reports(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Confirmed | AppointmentStatus::Completed
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "Requested"),
            AppointmentStatus::Confirmed => write!(f, "Confirmed"),
            AppointmentStatus::Rejected => write!(f, "Rejected"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}
