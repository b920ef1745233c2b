// libs/scheduling-cell/src/services/availability.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::store::StoreClient;
use shared_models::appointment::AppointmentStatus;

use crate::models::{Appointment, SchedulingError};
use crate::services::calendar;

/// Compute the free slots for a doctor on a date, given the existing
/// appointments for that date and the current wall-clock instant.
///
/// Pure with respect to its inputs: callers inject `now` so the same-day
/// cutoff is testable. With `doctor_id` unset no conflict filtering is
/// applied; that mode backs the doctor-selection preview only.
pub fn free_slots(
    doctor_id: Option<Uuid>,
    date: NaiveDate,
    existing: &[Appointment],
    now: DateTime<Utc>,
) -> Vec<NaiveTime> {
    // A non-bookable day has no slots; that is an empty result, not an error.
    if !calendar::is_bookable_day(date) {
        return Vec::new();
    }

    let busy_hours: HashSet<u32> = existing
        .iter()
        .filter(|apt| apt.status.occupies_slot())
        .filter(|apt| doctor_id.map_or(true, |id| apt.doctor_id == id))
        .filter(|apt| calendar::clinic_slot_date(apt.scheduled_at) == date)
        .map(|apt| calendar::clinic_slot_hour(apt.scheduled_at))
        .collect();

    let today = calendar::clinic_today(now);
    let (now_hour, now_minute) = calendar::clinic_now_parts(now);

    calendar::daily_slot_grid()
        .into_iter()
        .filter(|slot| !busy_hours.contains(&slot.hour()))
        .filter(|slot| {
            if date != today {
                return true;
            }
            // Same-day cutoff: a slot is offered only while its start hour
            // has not begun. The current hour stays offered at minute zero
            // exactly.
            if slot.hour() < now_hour {
                return false;
            }
            slot.hour() > now_hour || now_minute == 0
        })
        .collect()
}

/// Store-backed resolver: fetches the day's non-cancelled appointments and
/// delegates to [`free_slots`].
pub struct AvailabilityService {
    store: Arc<StoreClient>,
}

impl AvailabilityService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    pub async fn free_slots_for(
        &self,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        debug!("Resolving free slots for doctor {:?} on {}", doctor_id, date);

        if !calendar::is_bookable_day(date) {
            return Ok(Vec::new());
        }

        let existing = self
            .appointments_for_date(doctor_id, date, auth_token)
            .await?;

        Ok(free_slots(doctor_id, date, &existing, Utc::now()))
    }

    /// Non-cancelled appointments on a clinic-local date, optionally
    /// narrowed to one doctor.
    pub async fn appointments_for_date(
        &self,
        doctor_id: Option<Uuid>,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (day_start, day_end) = calendar::clinic_day_bounds(date)
            .ok_or_else(|| SchedulingError::Validation(format!("Invalid date: {}", date)))?;

        let mut path = format!(
            "/rest/v1/appointments?scheduled_at=gte.{}&scheduled_at=lt.{}&status=neq.{}&order=scheduled_at.asc",
            urlencoding::encode(&day_start.to_rfc3339()),
            urlencoding::encode(&day_end.to_rfc3339()),
            AppointmentStatus::Cancelled,
        );
        if let Some(id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", id));
        }

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let appointments = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| SchedulingError::Dependency(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments)
    }
}
