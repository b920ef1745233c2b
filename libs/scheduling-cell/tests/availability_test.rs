// libs/scheduling-cell/tests/availability_test.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use uuid::Uuid;

use scheduling_cell::models::Appointment;
use scheduling_cell::services::availability::free_slots;
use scheduling_cell::services::calendar::slot_instant;
use shared_models::appointment::AppointmentStatus;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(d: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    slot_instant(d, NaiveTime::from_hms_opt(hour, minute, 0).unwrap()).unwrap()
}

fn appointment(doctor_id: Uuid, scheduled_at: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id,
        specialty_id: None,
        scheduled_at,
        status,
        note: None,
        price_cents: Some(10_000),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        patient_first_name: None,
        patient_last_name: None,
        has_report: None,
        report_archived: None,
    }
}

// A future Monday relative to the injected clock below.
const YEAR: i32 = 2025;

#[test]
fn test_open_weekday_offers_full_grid() {
    let d = date(YEAR, 3, 10);
    let now = at(date(YEAR, 3, 1), 10, 0);

    let slots = free_slots(Some(Uuid::new_v4()), d, &[], now);
    assert_eq!(slots.len(), 11);
    assert_eq!(slots.first().unwrap().hour(), 9);
    assert_eq!(slots.last().unwrap().hour(), 19);
}

#[test]
fn test_confirmed_appointment_removes_its_slot() {
    let d = date(YEAR, 3, 10);
    let doctor = Uuid::new_v4();
    let now = at(date(YEAR, 3, 1), 10, 0);

    let existing = vec![appointment(doctor, at(d, 14, 0), AppointmentStatus::Confirmed)];
    let slots = free_slots(Some(doctor), d, &existing, now);

    assert_eq!(slots.len(), 10);
    assert!(!slots.iter().any(|s| s.hour() == 14));
}

#[test]
fn test_requested_appointment_also_blocks() {
    let d = date(YEAR, 3, 10);
    let doctor = Uuid::new_v4();
    let now = at(date(YEAR, 3, 1), 10, 0);

    let existing = vec![appointment(doctor, at(d, 9, 0), AppointmentStatus::Requested)];
    let slots = free_slots(Some(doctor), d, &existing, now);

    assert!(!slots.iter().any(|s| s.hour() == 9));
}

#[test]
fn test_cancelled_appointment_frees_its_slot() {
    let d = date(YEAR, 3, 10);
    let doctor = Uuid::new_v4();
    let now = at(date(YEAR, 3, 1), 10, 0);

    let existing = vec![appointment(doctor, at(d, 14, 0), AppointmentStatus::Cancelled)];
    let slots = free_slots(Some(doctor), d, &existing, now);

    assert_eq!(slots.len(), 11);
    assert!(slots.iter().any(|s| s.hour() == 14));
}

#[test]
fn test_other_doctors_appointments_do_not_block() {
    let d = date(YEAR, 3, 10);
    let doctor = Uuid::new_v4();
    let other = Uuid::new_v4();
    let now = at(date(YEAR, 3, 1), 10, 0);

    let existing = vec![appointment(other, at(d, 14, 0), AppointmentStatus::Confirmed)];
    let slots = free_slots(Some(doctor), d, &existing, now);

    assert_eq!(slots.len(), 11);
}

#[test]
fn test_sunday_has_no_slots() {
    let now = at(date(YEAR, 3, 1), 10, 0);
    let slots = free_slots(Some(Uuid::new_v4()), date(YEAR, 3, 9), &[], now);
    assert!(slots.is_empty());
}

#[test]
fn test_holiday_has_no_slots() {
    let now = at(date(YEAR, 3, 1), 10, 0);
    let slots = free_slots(Some(Uuid::new_v4()), date(YEAR, 4, 25), &[], now);
    assert!(slots.is_empty());
}

#[test]
fn test_same_day_cutoff_drops_started_hours() {
    let d = date(YEAR, 3, 10);
    // Clinic clock reads 12:30
    let now = at(d, 12, 30);

    let slots = free_slots(Some(Uuid::new_v4()), d, &[], now);

    // 09..=12 are gone (12 has started), 13..=19 remain
    assert_eq!(slots.len(), 7);
    assert_eq!(slots.first().unwrap().hour(), 13);
}

#[test]
fn test_same_day_slot_kept_at_exact_hour() {
    let d = date(YEAR, 3, 10);
    // Exactly 12:00: the 12 o'clock slot has not started yet
    let now = at(d, 12, 0);

    let slots = free_slots(Some(Uuid::new_v4()), d, &[], now);

    assert_eq!(slots.first().unwrap().hour(), 12);
    assert_eq!(slots.len(), 8);
}

#[test]
fn test_future_date_unaffected_by_time_of_day() {
    let d = date(YEAR, 3, 11);
    let now = at(date(YEAR, 3, 10), 18, 45);

    let slots = free_slots(Some(Uuid::new_v4()), d, &[], now);
    assert_eq!(slots.len(), 11);
}

#[test]
fn test_no_doctor_filter_merges_all_conflicts() {
    let d = date(YEAR, 3, 10);
    let now = at(date(YEAR, 3, 1), 10, 0);

    let existing = vec![
        appointment(Uuid::new_v4(), at(d, 9, 0), AppointmentStatus::Confirmed),
        appointment(Uuid::new_v4(), at(d, 15, 0), AppointmentStatus::Requested),
    ];
    let slots = free_slots(None, d, &existing, now);

    assert_eq!(slots.len(), 9);
    assert!(!slots.iter().any(|s| s.hour() == 9 || s.hour() == 15));
}
