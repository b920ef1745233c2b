// libs/report-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::store::StoreError;
use shared_models::appointment::AppointmentStatus;
use shared_models::error::AppError;

// ==============================================================================
// REPORT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub id: Uuid,
    pub appointment_id: Uuid,
    /// Staff member who created the report.
    pub author_id: Uuid,
    pub note: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    /// Object key inside the report bucket; None for note-only reports.
    pub storage_path: Option<String>,
    /// Hex-encoded SHA-256 of the uploaded file contents.
    pub checksum_sha256: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Soft-delete trio: set together or not at all.
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_note: Option<String>,
    pub deleted_by_user_id: Option<Uuid>,
}

impl ReportDocument {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted()
    }
}

/// The slice of an appointment the report workflows need. Kept as its
/// own type so this cell never parses fields it does not use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFilePayload {
    pub filename: String,
    pub content_type: String,
    /// Raw file bytes, base64-encoded. A data-URL prefix is tolerated.
    pub data_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReportRequest {
    pub appointment_id: Uuid,
    pub note: Option<String>,
    pub file: Option<ReportFilePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReportRequest {
    /// Mandatory audit note explaining the removal.
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSearchQuery {
    pub appointment_id: Option<Uuid>,
    pub archived: Option<bool>,
    pub include_deleted: Option<bool>,
    /// Free-text match against the report note.
    pub q: Option<String>,
    pub uploaded_from: Option<DateTime<Utc>>,
    pub uploaded_to: Option<DateTime<Utc>>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDownload {
    pub file_name: String,
    pub content_type: String,
    pub data_base64: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReportError {
    #[error("Report not found")]
    NotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("Dependency error: {0}")]
    Dependency(String),
}

impl From<StoreError> for ReportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ReportError::Conflict(msg),
            StoreError::NotFound(_) => ReportError::NotFound,
            StoreError::Auth(msg) => ReportError::Forbidden(msg),
            other => ReportError::Dependency(other.to_string()),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound => AppError::NotFound("Report not found".to_string()),
            ReportError::AppointmentNotFound => {
                AppError::NotFound("Appointment not found".to_string())
            }
            ReportError::Validation(msg) => AppError::Validation(msg),
            ReportError::Conflict(msg) => AppError::Conflict(msg),
            ReportError::Forbidden(msg) => AppError::Forbidden(msg),
            ReportError::Dependency(msg) => AppError::Dependency(msg),
        }
    }
}
