// libs/scheduling-cell/src/services/gateway.rs
use chrono::{Timelike, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use report_cell::ReportService;
use shared_config::AppConfig;
use shared_database::store::{StoreClient, StoreError};
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::{Role, User};

use crate::models::{
    Appointment, AppointmentSearchQuery, ArchiveReportsResponse, BookAppointmentRequest,
    DeleteAppointmentResponse, Doctor, NotificationAck, NotificationChannel, NotificationKind,
    SchedulingError, Specialty, UpdateStatusRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::calendar;
use crate::services::lifecycle;
use crate::services::notify::NotificationTrigger;
use crate::services::pricing::PricingService;

/// Command surface of the scheduling cell. Every mutation re-validates on
/// the server side; whatever a client previewed is advisory only.
pub struct SchedulingGateway {
    store: Arc<StoreClient>,
    availability: AvailabilityService,
    pricing: PricingService,
    notifier: NotificationTrigger,
    reports: ReportService,
}

impl SchedulingGateway {
    pub fn new(config: &Arc<AppConfig>) -> Self {
        let store = Arc::new(StoreClient::new(config));
        Self {
            availability: AvailabilityService::new(store.clone()),
            pricing: PricingService::new(store.clone()),
            notifier: NotificationTrigger::new(config.clone()),
            reports: ReportService::with_store(store.clone()),
            store,
        }
    }

    // ==========================================================================
    // BOOKING
    // ==========================================================================

    /// Book an appointment for the calling patient. The requested instant
    /// is validated against the clinic calendar and the doctor's existing
    /// appointments; the store's uniqueness constraint settles any race.
    pub async fn book(
        &self,
        user: &User,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        if user.role_or_patient() != Role::Patient {
            return Err(SchedulingError::Forbidden(
                "Only patients may book appointments".to_string(),
            ));
        }
        let patient_id = parse_user_id(user)?;

        debug!(
            "Booking request: patient {} doctor {} at {}",
            patient_id, request.doctor_id, request.scheduled_at
        );

        self.validate_slot(&request).await?;

        let doctor = self.get_doctor(request.doctor_id, auth_token).await?;
        if let Some(specialty_id) = request.specialty_id {
            let offered = doctor
                .specialties
                .as_deref()
                .map_or(false, |list| list.iter().any(|s| s.id == specialty_id));
            if !offered {
                return Err(SchedulingError::Validation(format!(
                    "Doctor {} does not offer the requested specialty",
                    doctor.full_name()
                )));
            }
        }

        let price_cents = self
            .pricing
            .price_for_booking(request.specialty_id, auth_token)
            .await?;

        let existing = self
            .availability
            .appointments_for_date(
                Some(request.doctor_id),
                calendar::clinic_slot_date(request.scheduled_at),
                auth_token,
            )
            .await?;
        let requested_hour = calendar::clinic_slot_hour(request.scheduled_at);
        let taken = existing.iter().any(|apt| {
            apt.status.occupies_slot()
                && calendar::clinic_slot_hour(apt.scheduled_at) == requested_hour
        });
        if taken {
            return Err(SchedulingError::SlotTaken(request.scheduled_at));
        }

        let record = json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "doctor_id": request.doctor_id,
            "specialty_id": request.specialty_id,
            "scheduled_at": request.scheduled_at.to_rfc3339(),
            "status": AppointmentStatus::Requested,
            "note": request.note,
            "price_cents": price_cents,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Result<Vec<Value>, StoreError> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(record),
                Some(representation_headers()),
            )
            .await;

        let rows = match result {
            // Another booking won the slot between our check and the insert.
            Err(StoreError::Conflict(_)) => {
                return Err(SchedulingError::SlotTaken(request.scheduled_at));
            }
            other => other?,
        };

        let appointment = parse_appointment(rows.into_iter().next().ok_or_else(|| {
            SchedulingError::Dependency("Store returned no appointment record".to_string())
        })?)?;

        info!(
            "Appointment {} booked for patient {} with doctor {} at {}",
            appointment.id, patient_id, request.doctor_id, request.scheduled_at
        );
        Ok(appointment)
    }

    /// Calendar- and grid-level checks on a requested slot.
    async fn validate_slot(&self, request: &BookAppointmentRequest) -> Result<(), SchedulingError> {
        let date = calendar::clinic_slot_date(request.scheduled_at);
        if !calendar::is_bookable_day(date) {
            return Err(SchedulingError::Validation(format!(
                "The clinic is closed on {}",
                date
            )));
        }

        let hour = calendar::clinic_slot_hour(request.scheduled_at);
        let minute = request
            .scheduled_at
            .with_timezone(&calendar::CLINIC_TZ)
            .minute();
        if minute != 0 || hour < calendar::OPEN_HOUR || hour > calendar::CLOSE_HOUR {
            return Err(SchedulingError::Validation(format!(
                "Appointments start on the hour between {:02}:00 and {:02}:00",
                calendar::OPEN_HOUR,
                calendar::CLOSE_HOUR
            )));
        }

        let now = Utc::now();
        if date == calendar::clinic_today(now) {
            let (now_hour, now_minute) = calendar::clinic_now_parts(now);
            if hour < now_hour || (hour == now_hour && now_minute > 0) {
                return Err(SchedulingError::Validation(
                    "This slot has already started".to_string(),
                ));
            }
        } else if request.scheduled_at < now {
            return Err(SchedulingError::Validation(
                "Appointments cannot be booked in the past".to_string(),
            ));
        }

        Ok(())
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    /// Apply a status transition. The transition table decides legality;
    /// a cancellation additionally triggers a best-effort notification.
    pub async fn update_status(
        &self,
        user: &User,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.get(user, appointment_id, auth_token).await?;
        let role = user.role_or_patient();

        lifecycle::validate_transition(
            &appointment,
            request.status,
            role,
            request.note.as_deref(),
            Utc::now(),
        )?;

        let mut patch = json!({
            "status": request.status,
            "updated_at": Utc::now().to_rfc3339(),
        });
        if let Some(note) = &request.note {
            patch["note"] = json!(note);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(patch),
                Some(representation_headers()),
            )
            .await?;

        let updated =
            parse_appointment(rows.into_iter().next().ok_or(SchedulingError::NotFound)?)?;

        info!(
            "Appointment {} moved {} -> {} by {} ({})",
            appointment_id, appointment.status, updated.status, user.id, role
        );

        if updated.status == AppointmentStatus::Cancelled {
            // Fire-and-forget: delivery failure must not undo the cancellation.
            match self
                .notifier
                .notify(
                    &updated,
                    NotificationChannel::Email,
                    NotificationKind::Cancellation,
                    role,
                )
                .await
            {
                Ok(ack) if !ack.delivered => {
                    warn!(
                        "Cancellation notice for appointment {} not delivered",
                        appointment_id
                    );
                }
                Err(e) => warn!(
                    "Cancellation notice for appointment {} skipped: {}",
                    appointment_id, e
                ),
                _ => {}
            }
        }

        Ok(updated)
    }

    /// Remove an appointment entirely. Refused while any non-deleted
    /// report references it; archived reports still block.
    pub async fn delete(
        &self,
        user: &User,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<DeleteAppointmentResponse, SchedulingError> {
        let role = user.role_or_patient();
        if !role.is_front_desk() {
            return Err(SchedulingError::Forbidden(
                "Only front-desk staff may delete appointments".to_string(),
            ));
        }

        // Existence check before the guard so a missing id reads as 404.
        let _ = self.fetch_appointment(appointment_id, auth_token).await?;

        let active_reports = self
            .reports
            .count_active(appointment_id, auth_token)
            .await
            .map_err(|e| SchedulingError::Dependency(e.to_string()))?;
        if active_reports > 0 {
            return Err(SchedulingError::Validation(format!(
                "Appointment has {} non-deleted report(s); delete them first",
                active_reports
            )));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let _: Value = self
            .store
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await?;

        info!("Appointment {} deleted by {}", appointment_id, user.id);
        Ok(DeleteAppointmentResponse {
            id: appointment_id,
            deleted: true,
        })
    }

    /// Archive all active reports of an appointment in one action.
    pub async fn archive_reports(
        &self,
        user: &User,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<ArchiveReportsResponse, SchedulingError> {
        let _ = self.fetch_appointment(appointment_id, auth_token).await?;

        let archived = self
            .reports
            .archive_for_appointment(user, appointment_id, auth_token)
            .await
            .map_err(report_to_scheduling)?;

        Ok(ArchiveReportsResponse {
            appointment_id,
            archived_reports: archived,
        })
    }

    // ==========================================================================
    // NOTIFICATIONS
    // ==========================================================================

    pub async fn notify(
        &self,
        user: &User,
        appointment_id: Uuid,
        channel: NotificationChannel,
        kind: NotificationKind,
        auth_token: &str,
    ) -> Result<NotificationAck, SchedulingError> {
        let appointment = self.fetch_appointment(appointment_id, auth_token).await?;
        self.notifier
            .notify(&appointment, channel, kind, user.role_or_patient())
            .await
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    /// Fetch one appointment, scoped to the caller: patients and doctors
    /// only see their own.
    pub async fn get(
        &self,
        user: &User,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.fetch_appointment(appointment_id, auth_token).await?;
        let user_id = parse_user_id(user)?;

        let visible = match user.role_or_patient() {
            Role::Patient => appointment.patient_id == user_id,
            Role::Doctor => appointment.doctor_id == user_id,
            Role::Secretary | Role::Admin => true,
        };
        if !visible {
            // Hidden rows read as missing, not as forbidden.
            return Err(SchedulingError::NotFound);
        }

        Ok(appointment)
    }

    /// List appointments for the caller. Patients are pinned to their own
    /// bookings and doctors to their own schedule regardless of the query.
    pub async fn list(
        &self,
        user: &User,
        query: &AppointmentSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let user_id = parse_user_id(user)?;
        let mut scoped = query.clone();
        match user.role_or_patient() {
            Role::Patient => scoped.patient_id = Some(user_id),
            Role::Doctor => scoped.doctor_id = Some(user_id),
            Role::Secretary | Role::Admin => {}
        }

        let mut path = String::from("/rest/v1/appointments?order=scheduled_at.asc");
        if let Some(status) = scoped.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(doctor_id) = scoped.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        if let Some(patient_id) = scoped.patient_id {
            path.push_str(&format!("&patient_id=eq.{}", patient_id));
        }
        if let Some(from) = scoped.scheduled_from {
            path.push_str(&format!(
                "&scheduled_at=gte.{}",
                urlencoding::encode(&from.to_rfc3339())
            ));
        }
        if let Some(to) = scoped.scheduled_to {
            path.push_str(&format!(
                "&scheduled_at=lt.{}",
                urlencoding::encode(&to.to_rfc3339())
            ));
        }
        if let Some(report_archived) = scoped.report_archived {
            path.push_str(&format!("&report_archived=eq.{}", report_archived));
        }
        if let Some(limit) = scoped.limit {
            path.push_str(&format!("&limit={}", limit.clamp(1, 100)));
        }
        if let Some(offset) = scoped.offset {
            path.push_str(&format!("&offset={}", offset.max(0)));
        }

        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter().map(parse_appointment).collect()
    }

    /// List doctors, optionally narrowed to those offering a specialty.
    /// The filtered form drives the booking flow's doctor-selection step.
    pub async fn list_doctors(
        &self,
        specialty_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, SchedulingError> {
        let path = match specialty_id {
            Some(id) => format!(
                "/rest/v1/doctors?select=*,specialties!inner(*)&specialties.id=eq.{}&order=last_name.asc",
                id
            ),
            None => "/rest/v1/doctors?select=*,specialties(*)&order=last_name.asc".to_string(),
        };
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| SchedulingError::Dependency(format!("Failed to parse doctors: {}", e)))
    }

    pub async fn list_specialties(
        &self,
        auth_token: &str,
    ) -> Result<Vec<Specialty>, SchedulingError> {
        let rows: Vec<Value> = self
            .store
            .request(
                Method::GET,
                "/rest/v1/specialties?order=name.asc",
                Some(auth_token),
                None,
            )
            .await?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Specialty>, _>>()
            .map_err(|e| SchedulingError::Dependency(format!("Failed to parse specialties: {}", e)))
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability
    }

    // ==========================================================================
    // INTERNAL
    // ==========================================================================

    async fn fetch_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        parse_appointment(rows.into_iter().next().ok_or(SchedulingError::NotFound)?)
    }

    async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Doctor, SchedulingError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=*,specialties(*)",
            doctor_id
        );
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let record = rows
            .into_iter()
            .next()
            .ok_or(SchedulingError::DoctorNotFound)?;
        serde_json::from_value(record)
            .map_err(|e| SchedulingError::Dependency(format!("Failed to parse doctor: {}", e)))
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn parse_appointment(value: Value) -> Result<Appointment, SchedulingError> {
    serde_json::from_value(value)
        .map_err(|e| SchedulingError::Dependency(format!("Failed to parse appointment: {}", e)))
}

fn parse_user_id(user: &User) -> Result<Uuid, SchedulingError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| SchedulingError::Validation(format!("Invalid user id: {}", user.id)))
}

fn report_to_scheduling(err: report_cell::ReportError) -> SchedulingError {
    use report_cell::ReportError;
    match err {
        ReportError::NotFound | ReportError::AppointmentNotFound => SchedulingError::NotFound,
        ReportError::Validation(msg) => SchedulingError::Validation(msg),
        ReportError::Conflict(msg) => SchedulingError::Conflict(msg),
        ReportError::Forbidden(msg) => SchedulingError::Forbidden(msg),
        ReportError::Dependency(msg) => SchedulingError::Dependency(msg),
    }
}
