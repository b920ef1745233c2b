// libs/scheduling-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};

use shared_models::appointment::AppointmentStatus;
use shared_models::auth::Role;

use crate::models::{Appointment, SchedulingError};

/// Who may drive a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Doctor, Secretary or Admin.
    Staff,
    /// Secretary or Admin.
    FrontDesk,
}

impl Gate {
    fn allows(&self, role: Role) -> bool {
        match self {
            Gate::Staff => role.is_staff(),
            Gate::FrontDesk => role.is_front_desk(),
        }
    }
}

struct TransitionRule {
    from: AppointmentStatus,
    to: AppointmentStatus,
    gate: Gate,
    /// A non-empty note must accompany the transition.
    requires_note: bool,
    /// The appointment's scheduled instant must already have passed.
    requires_elapsed: bool,
}

/// The complete set of legal status transitions. Anything not listed here
/// is rejected, including self-transitions and anything out of a terminal
/// status.
const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: AppointmentStatus::Requested,
        to: AppointmentStatus::Confirmed,
        gate: Gate::Staff,
        requires_note: false,
        requires_elapsed: false,
    },
    TransitionRule {
        from: AppointmentStatus::Requested,
        to: AppointmentStatus::Rejected,
        gate: Gate::Staff,
        requires_note: true,
        requires_elapsed: false,
    },
    TransitionRule {
        from: AppointmentStatus::Confirmed,
        to: AppointmentStatus::Cancelled,
        gate: Gate::Staff,
        requires_note: false,
        requires_elapsed: false,
    },
    TransitionRule {
        from: AppointmentStatus::Confirmed,
        to: AppointmentStatus::Completed,
        gate: Gate::FrontDesk,
        requires_note: false,
        requires_elapsed: true,
    },
];

/// Validate a requested status change against the transition table.
///
/// Returns `Ok(())` when the transition is legal for this role, the note
/// requirement is satisfied, and any elapsed-time precondition holds at
/// `now`.
pub fn validate_transition(
    appointment: &Appointment,
    to: AppointmentStatus,
    role: Role,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), SchedulingError> {
    let rule = TRANSITIONS
        .iter()
        .find(|r| r.from == appointment.status && r.to == to)
        .ok_or(SchedulingError::IllegalTransition {
            from: appointment.status,
            to,
        })?;

    if !rule.gate.allows(role) {
        return Err(SchedulingError::Forbidden(format!(
            "Role {} may not move an appointment from {} to {}",
            role, rule.from, rule.to
        )));
    }

    if rule.requires_note && note.map_or(true, |n| n.trim().is_empty()) {
        return Err(SchedulingError::Validation(
            "A rejection note is required".to_string(),
        ));
    }

    if rule.requires_elapsed && appointment.scheduled_at > now {
        return Err(SchedulingError::Validation(
            "An appointment cannot be completed before its scheduled time".to_string(),
        ));
    }

    Ok(())
}

/// The statuses an appointment in `from` may legally move to, ignoring
/// role and precondition checks. Used to surface actions in listings.
pub fn reachable_statuses(from: AppointmentStatus) -> Vec<AppointmentStatus> {
    TRANSITIONS
        .iter()
        .filter(|r| r.from == from)
        .map(|r| r.to)
        .collect()
}
