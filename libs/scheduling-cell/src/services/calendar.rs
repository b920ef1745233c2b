// libs/scheduling-cell/src/services/calendar.rs
//
// Bookable-day and slot-grid rules for the clinic. All date semantics are
// evaluated in the clinic's fixed timezone (Europe/Rome) regardless of the
// client's locale; callers pass UTC instants and get local calendar answers.
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Europe::Rome;
use chrono_tz::Tz;
use std::collections::HashSet;

pub const CLINIC_TZ: Tz = Rome;

/// First bookable hour of the day (inclusive).
pub const OPEN_HOUR: u32 = 9;
/// Last bookable hour of the day (inclusive).
pub const CLOSE_HOUR: u32 = 19;

/// The fixed daily grid: one-hour slots from 09:00 to 19:00 inclusive.
pub fn daily_slot_grid() -> Vec<NaiveTime> {
    (OPEN_HOUR..=CLOSE_HOUR)
        .map(|h| NaiveTime::from_hms_opt(h, 0, 0).expect("grid hour in range"))
        .collect()
}

/// Easter Sunday for a year, via the anonymous Gregorian computus.
/// Re-derived per calendar year; never hard-coded.
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).expect("computus yields a valid date")
}

/// Italian public holidays for a year: the fixed civil/religious list plus
/// the moveable Easter Sunday and Easter Monday.
pub fn holidays_for_year(year: i32) -> HashSet<NaiveDate> {
    let fixed = [
        (1, 1),   // Capodanno
        (1, 6),   // Epifania
        (4, 25),  // Liberazione
        (5, 1),   // Festa del Lavoro
        (6, 2),   // Festa della Repubblica
        (8, 15),  // Ferragosto
        (11, 1),  // Ognissanti
        (12, 8),  // Immacolata
        (12, 25), // Natale
        (12, 26), // Santo Stefano
    ];

    let mut holidays: HashSet<NaiveDate> = fixed
        .iter()
        .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .collect();

    let easter = easter_sunday(year);
    holidays.insert(easter);
    holidays.insert(easter.succ_opt().expect("Easter Monday exists"));

    holidays
}

/// A day is bookable iff it is not a Sunday and not a public holiday.
pub fn is_bookable_day(date: NaiveDate) -> bool {
    if date.weekday() == Weekday::Sun {
        return false;
    }
    !holidays_for_year(date.year()).contains(&date)
}

/// The clinic-local calendar date for a UTC instant.
pub fn clinic_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&CLINIC_TZ).date_naive()
}

/// The clinic-local (hour, minute) for a UTC instant, used for the
/// same-day booking cutoff.
pub fn clinic_now_parts(now: DateTime<Utc>) -> (u32, u32) {
    let local = now.with_timezone(&CLINIC_TZ);
    use chrono::Timelike;
    (local.hour(), local.minute())
}

/// The clinic-local hour a stored appointment occupies.
pub fn clinic_slot_hour(scheduled_at: DateTime<Utc>) -> u32 {
    use chrono::Timelike;
    scheduled_at.with_timezone(&CLINIC_TZ).hour()
}

/// The clinic-local date a stored appointment falls on.
pub fn clinic_slot_date(scheduled_at: DateTime<Utc>) -> NaiveDate {
    scheduled_at.with_timezone(&CLINIC_TZ).date_naive()
}

/// Resolve a local (date, time) slot to its UTC instant. DST gaps have no
/// single mapping; those resolve to the earliest valid instant.
pub fn slot_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let local = date.and_time(time);
    CLINIC_TZ
        .from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The UTC bounds of a clinic-local calendar day, for range queries
/// against the store.
pub fn clinic_day_bounds(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = slot_instant(date, NaiveTime::from_hms_opt(0, 0, 0)?)?;
    let end = slot_instant(date.succ_opt()?, NaiveTime::from_hms_opt(0, 0, 0)?)?;
    Some((start, end))
}
