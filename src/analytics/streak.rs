use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::analytics::date_math::add_days;
use crate::models::MoodLogEntry;

pub const CONSISTENCY_WINDOW_DAYS: i64 = 30;

/// Unique valid log days up to and including `today`, ascending.
fn logged_days(logs: &[MoodLogEntry], today: NaiveDate) -> BTreeSet<NaiveDate> {
    logs.iter()
        .map(|log| log.date)
        .filter(|date| *date <= today)
        .collect()
}

/// Longest run of consecutive logged days ever, not only the run ending today.
pub fn calculate_streak(logs: &[MoodLogEntry], today: NaiveDate) -> u32 {
    let days = logged_days(logs, today);

    let mut best = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(day);
    }

    best
}

/// Share of the trailing 30 days (today included) with at least one log.
pub fn calculate_consistency(logs: &[MoodLogEntry], today: NaiveDate) -> u32 {
    let window_start = add_days(today, -(CONSISTENCY_WINDOW_DAYS - 1)).unwrap_or(NaiveDate::MIN);
    let count = logged_days(logs, today)
        .range(window_start..=today)
        .count();

    let pct = (count as f64 / CONSISTENCY_WINDOW_DAYS as f64 * 100.0).round() as u32;
    pct.min(100)
}
