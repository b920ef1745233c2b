// libs/report-cell/src/services/report.rs
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::store::StoreClient;
use shared_models::auth::{Role, User};

use crate::models::{
    AppointmentSnapshot, DeleteReportRequest, ReportDocument, ReportDownload, ReportError,
    ReportSearchQuery, UpdateNoteRequest, UploadReportRequest,
};

const REPORT_BUCKET: &str = "reports";

pub struct ReportService {
    store: Arc<StoreClient>,
}

impl ReportService {
    pub fn new(config: &shared_config::AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    pub fn with_store(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Create a report for an appointment. At least one of note and file
    /// must be present; the appointment must already have taken place and
    /// be in a status that accepts reports.
    pub async fn upload(
        &self,
        user: &User,
        request: UploadReportRequest,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        let role = require_staff(user)?;
        debug!(
            "Uploading report for appointment {} by {} ({})",
            request.appointment_id, user.id, role
        );

        let has_note = request
            .note
            .as_deref()
            .map_or(false, |n| !n.trim().is_empty());
        if !has_note && request.file.is_none() {
            return Err(ReportError::Validation(
                "A report needs a file or a non-empty note".to_string(),
            ));
        }

        let appointment = self
            .get_appointment(request.appointment_id, auth_token)
            .await?;
        check_report_eligibility(&appointment, Utc::now())?;

        let author_id = parse_user_id(user)?;
        let report_id = Uuid::new_v4();

        let mut record = json!({
            "id": report_id,
            "appointment_id": appointment.id,
            "author_id": author_id,
            "note": request.note,
            "archived": false,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        if let Some(file) = &request.file {
            let bytes = decode_file_payload(&file.data_base64)?;
            if bytes.is_empty() {
                return Err(ReportError::Validation(
                    "Report file is empty".to_string(),
                ));
            }

            let checksum = hex_sha256(&bytes);
            let ext = extension_for(&file.filename, &file.content_type);
            let object_key = format!("{}/{}/{}.{}", REPORT_BUCKET, appointment.id, report_id, ext);
            let storage_path = format!("/storage/v1/object/{}", object_key);

            self.store
                .upload_object(&storage_path, &file.content_type, bytes, auth_token)
                .await?;

            record["file_name"] = json!(file.filename);
            record["content_type"] = json!(file.content_type);
            record["storage_path"] = json!(object_key);
            record["checksum_sha256"] = json!(checksum);
        }

        let created = self.insert_record(record, auth_token).await?;
        info!(
            "Report {} created for appointment {}",
            created.id, created.appointment_id
        );
        Ok(created)
    }

    /// Replace the note of a report. Allowed while the report is not
    /// deleted; archival does not freeze the note.
    pub async fn update_note(
        &self,
        user: &User,
        report_id: Uuid,
        request: UpdateNoteRequest,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        require_staff(user)?;

        if request.note.trim().is_empty() {
            return Err(ReportError::Validation(
                "Report note cannot be empty".to_string(),
            ));
        }

        let _ = self.get_active(report_id, auth_token).await?;

        self.patch_record(
            report_id,
            json!({
                "note": request.note,
                "updated_at": Utc::now().to_rfc3339(),
            }),
            auth_token,
        )
        .await
    }

    /// Archive a report. Archiving an already-archived report is a
    /// conflict, not a no-op.
    pub async fn archive(
        &self,
        user: &User,
        report_id: Uuid,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        require_staff(user)?;

        let report = self.get_active(report_id, auth_token).await?;
        if report.archived {
            return Err(ReportError::Conflict(
                "Report is already archived".to_string(),
            ));
        }

        let updated = self
            .patch_record(
                report_id,
                json!({
                    "archived": true,
                    "updated_at": Utc::now().to_rfc3339(),
                }),
                auth_token,
            )
            .await?;
        info!("Report {} archived", report_id);
        Ok(updated)
    }

    /// Archive every active, unarchived report of an appointment.
    /// Returns how many were archived; zero is a valid outcome.
    pub async fn archive_for_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<u32, ReportError> {
        require_staff(user)?;

        let path = format!(
            "/rest/v1/reports?appointment_id=eq.{}&archived=eq.false&deleted_at=is.null",
            appointment_id
        );
        let updated: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(json!({
                    "archived": true,
                    "updated_at": Utc::now().to_rfc3339(),
                })),
                Some(representation_headers()),
            )
            .await?;

        let count = updated.len() as u32;
        info!(
            "Archived {} report(s) for appointment {}",
            count, appointment_id
        );
        Ok(count)
    }

    /// Soft-delete a report. Requires an audit note; sets the deletion
    /// timestamp, note and actor together. The storage object is kept.
    pub async fn soft_delete(
        &self,
        user: &User,
        report_id: Uuid,
        request: DeleteReportRequest,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        require_staff(user)?;

        if request.note.trim().is_empty() {
            return Err(ReportError::Validation(
                "A deletion note is required".to_string(),
            ));
        }

        // Confirm the report exists and is not already deleted.
        let _ = self.get_active(report_id, auth_token).await?;
        let deleted_by = parse_user_id(user)?;

        let updated = self
            .patch_record(
                report_id,
                json!({
                    "deleted_at": Utc::now().to_rfc3339(),
                    "deleted_note": request.note,
                    "deleted_by_user_id": deleted_by,
                    "updated_at": Utc::now().to_rfc3339(),
                }),
                auth_token,
            )
            .await?;
        info!("Report {} soft-deleted by {}", report_id, user.id);
        Ok(updated)
    }

    pub async fn search(
        &self,
        user: &User,
        query: &ReportSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<ReportDocument>, ReportError> {
        require_staff(user)?;

        let mut path = String::from("/rest/v1/reports?order=created_at.desc");
        if let Some(appointment_id) = query.appointment_id {
            path.push_str(&format!("&appointment_id=eq.{}", appointment_id));
        }
        if let Some(archived) = query.archived {
            path.push_str(&format!("&archived=eq.{}", archived));
        }
        if !query.include_deleted.unwrap_or(false) {
            path.push_str("&deleted_at=is.null");
        }
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            path.push_str(&format!(
                "&note=ilike.{}",
                urlencoding::encode(&format!("*{}*", q))
            ));
        }
        if let Some(from) = query.uploaded_from {
            path.push_str(&format!(
                "&created_at=gte.{}",
                urlencoding::encode(&from.to_rfc3339())
            ));
        }
        if let Some(to) = query.uploaded_to {
            path.push_str(&format!(
                "&created_at=lt.{}",
                urlencoding::encode(&to.to_rfc3339())
            ));
        }
        if let Some(limit) = query.limit {
            path.push_str(&format!("&limit={}", limit.clamp(1, 100)));
        }
        if let Some(offset) = query.offset {
            path.push_str(&format!("&offset={}", offset.max(0)));
        }

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ReportDocument>, _>>()
            .map_err(|e| ReportError::Dependency(format!("Failed to parse reports: {}", e)))
    }

    /// Fetch the file of an active report from storage, re-encoded for a
    /// JSON response. Verifies the stored checksum before returning.
    pub async fn download(
        &self,
        user: &User,
        report_id: Uuid,
        auth_token: &str,
    ) -> Result<ReportDownload, ReportError> {
        require_staff(user)?;

        let report = self.get_active(report_id, auth_token).await?;
        let object_key = report.storage_path.as_deref().ok_or_else(|| {
            ReportError::Validation("This report has no attached file".to_string())
        })?;

        let storage_path = format!("/storage/v1/object/{}", object_key);
        let (bytes, content_type) = self.store.fetch_object(&storage_path, auth_token).await?;

        if let Some(expected) = &report.checksum_sha256 {
            let actual = hex_sha256(&bytes);
            if &actual != expected {
                return Err(ReportError::Dependency(format!(
                    "Checksum mismatch for report {}: stored object is corrupt",
                    report_id
                )));
            }
        }

        Ok(ReportDownload {
            file_name: report
                .file_name
                .unwrap_or_else(|| format!("report-{}", report_id)),
            content_type: report
                .content_type
                .or(content_type)
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            data_base64: BASE64.encode(bytes),
        })
    }

    /// How many active (non-deleted) reports an appointment has. The
    /// appointment delete guard runs on this; archived reports still
    /// count because archival preserves the document.
    pub async fn count_active(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<u32, ReportError> {
        let path = format!(
            "/rest/v1/reports?appointment_id=eq.{}&deleted_at=is.null&select=id",
            appointment_id
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(result.len() as u32)
    }

    pub async fn get_active(
        &self,
        report_id: Uuid,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        let path = format!("/rest/v1/reports?id=eq.{}&deleted_at=is.null", report_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let record = result.into_iter().next().ok_or(ReportError::NotFound)?;
        serde_json::from_value(record)
            .map_err(|e| ReportError::Dependency(format!("Failed to parse report: {}", e)))
    }

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentSnapshot, ReportError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select=id,patient_id,doctor_id,scheduled_at,status",
            appointment_id
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let record = result
            .into_iter()
            .next()
            .ok_or(ReportError::AppointmentNotFound)?;
        serde_json::from_value(record)
            .map_err(|e| ReportError::Dependency(format!("Failed to parse appointment: {}", e)))
    }

    async fn insert_record(
        &self,
        record: Value,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/reports",
                Some(auth_token),
                Some(record),
                Some(representation_headers()),
            )
            .await?;

        let created = result.into_iter().next().ok_or_else(|| {
            ReportError::Dependency("Store returned no report record".to_string())
        })?;
        serde_json::from_value(created)
            .map_err(|e| ReportError::Dependency(format!("Failed to parse report: {}", e)))
    }

    async fn patch_record(
        &self,
        report_id: Uuid,
        patch: Value,
        auth_token: &str,
    ) -> Result<ReportDocument, ReportError> {
        let path = format!("/rest/v1/reports?id=eq.{}", report_id);
        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(patch),
                Some(representation_headers()),
            )
            .await?;

        let updated = result.into_iter().next().ok_or(ReportError::NotFound)?;
        serde_json::from_value(updated)
            .map_err(|e| ReportError::Dependency(format!("Failed to parse report: {}", e)))
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn require_staff(user: &User) -> Result<Role, ReportError> {
    let role = user.role_or_patient();
    if role.is_staff() {
        Ok(role)
    } else {
        Err(ReportError::Forbidden(
            "Only staff may manage reports".to_string(),
        ))
    }
}

fn parse_user_id(user: &User) -> Result<Uuid, ReportError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| ReportError::Validation(format!("Invalid user id: {}", user.id)))
}

/// A report may only be attached once the visit has taken place.
pub fn check_report_eligibility(
    appointment: &AppointmentSnapshot,
    now: chrono::DateTime<Utc>,
) -> Result<(), ReportError> {
    if !appointment.status.accepts_reports() {
        return Err(ReportError::Validation(format!(
            "Reports cannot be attached to a {} appointment",
            appointment.status
        )));
    }
    if appointment.scheduled_at > now {
        return Err(ReportError::Validation(
            "Appointment not yet occurred".to_string(),
        ));
    }
    Ok(())
}

fn decode_file_payload(data: &str) -> Result<Vec<u8>, ReportError> {
    let base64_data = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    BASE64
        .decode(base64_data.trim())
        .map_err(|e| ReportError::Validation(format!("Failed to decode base64 data: {}", e)))
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn extension_for(filename: &str, content_type: &str) -> String {
    if let Some((_, ext)) = filename.rsplit_once('.') {
        if !ext.is_empty() && ext.len() <= 8 {
            return ext.to_ascii_lowercase();
        }
    }
    match content_type.rsplit_once('/') {
        Some((_, sub)) if !sub.is_empty() => sub.to_ascii_lowercase(),
        _ => "bin".to_string(),
    }
}
