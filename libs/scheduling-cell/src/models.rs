// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::store::StoreError;
use shared_models::appointment::AppointmentStatus;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub specialty_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    /// Free text attached to the appointment; the rejection reason lands
    /// here and is visible to the patient.
    pub note: Option<String>,
    /// Derived once at booking from the specialty price table, immutable
    /// afterward.
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Projection fields filled in by the store's list view.
    #[serde(default)]
    pub patient_first_name: Option<String>,
    #[serde(default)]
    pub patient_last_name: Option<String>,
    #[serde(default)]
    pub has_report: Option<bool>,
    #[serde(default)]
    pub report_archived: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specialty {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specialties: Option<Vec<Specialty>>,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub specialty_id: Option<Uuid>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub scheduled_from: Option<DateTime<Utc>>,
    pub scheduled_to: Option<DateTime<Utc>>,
    pub report_archived: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

impl Default for AppointmentSearchQuery {
    fn default() -> Self {
        Self {
            status: None,
            doctor_id: None,
            patient_id: None,
            scheduled_from: None,
            scheduled_to: None,
            report_archived: None,
            limit: None,
            offset: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeSlotsQuery {
    pub doctor_id: Option<Uuid>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeSlotsResponse {
    pub date: NaiveDate,
    pub doctor_id: Option<Uuid>,
    pub slots: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteAppointmentResponse {
    pub id: Uuid,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReportsResponse {
    pub appointment_id: Uuid,
    pub archived_reports: u32,
}

// ==============================================================================
// NOTIFICATION TRIGGER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    Cancellation,
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Sms => write!(f, "sms"),
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Reminder => write!(f, "reminder"),
            NotificationKind::Cancellation => write!(f, "cancellation"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub channel: NotificationChannel,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationAck {
    pub appointment_id: Uuid,
    pub channel: NotificationChannel,
    pub kind: NotificationKind,
    /// False when the outbound webhook failed; the triggering command has
    /// already committed either way.
    pub delivered: bool,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Specialty not found")]
    SpecialtyNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Slot no longer available for this doctor at {0}")]
    SlotTaken(DateTime<Utc>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("Dependency error: {0}")]
    Dependency(String),
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => SchedulingError::Conflict(msg),
            StoreError::NotFound(_) => SchedulingError::NotFound,
            StoreError::Auth(msg) => SchedulingError::Forbidden(msg),
            other => SchedulingError::Dependency(other.to_string()),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            SchedulingError::SpecialtyNotFound => {
                AppError::NotFound("Specialty not found".to_string())
            }
            SchedulingError::Validation(msg) => AppError::Validation(msg),
            e @ SchedulingError::IllegalTransition { .. } => AppError::Validation(e.to_string()),
            e @ SchedulingError::SlotTaken(_) => {
                AppError::Conflict(format!("{} - please refresh and retry", e))
            }
            SchedulingError::Conflict(msg) => AppError::Conflict(msg),
            SchedulingError::Forbidden(msg) => AppError::Forbidden(msg),
            SchedulingError::Dependency(msg) => AppError::Dependency(msg),
        }
    }
}
