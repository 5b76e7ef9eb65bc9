use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::analytics::date_math::{add_days, to_date};
use crate::models::{Mood, MoodLogEntry, MoodTrend, RawMoodEntry, MAX_SYMPTOMS};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Canonicalizes a raw log. Returns `None` when the date cannot be parsed;
/// unknown moods collapse to [`Mood::FALLBACK`].
pub fn normalize_mood_entry(raw: &RawMoodEntry) -> Option<MoodLogEntry> {
    let date = to_date(&raw.date)?;

    let mood = raw
        .mood
        .as_deref()
        .and_then(Mood::parse)
        .unwrap_or(Mood::FALLBACK);

    let note = raw
        .note
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let mut seen = BTreeSet::new();
    let symptoms = raw
        .symptoms
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_string()))
        .take(MAX_SYMPTOMS)
        .map(str::to_string)
        .collect();

    Some(MoodLogEntry { date, mood, note, symptoms })
}

/// Zero-filled count per mood over `[reference - (days - 1), reference]`.
/// A window reaching past the start of the calendar covers everything up to
/// `reference`.
pub fn calculate_mood_distribution(
    logs: &[MoodLogEntry],
    days: u32,
    reference: NaiveDate,
) -> BTreeMap<Mood, u32> {
    let mut distribution: BTreeMap<Mood, u32> = Mood::ALL.iter().map(|m| (*m, 0)).collect();
    if days == 0 {
        return distribution;
    }
    let window_start = add_days(reference, -(i64::from(days) - 1)).unwrap_or(NaiveDate::MIN);

    for log in logs {
        if log.date < window_start || log.date > reference {
            continue;
        }
        *distribution.entry(log.mood).or_insert(0) += 1;
    }

    distribution
}

/// Dominant mood (ties go to the alphabetically first mood) and the run of
/// identical moods ending at the most recent log.
pub fn summarize_mood_trend(logs: &[MoodLogEntry]) -> MoodTrend {
    let mut counts: BTreeMap<Mood, u32> = BTreeMap::new();
    for log in logs {
        *counts.entry(log.mood).or_insert(0) += 1;
    }

    let dominant = counts
        .iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.as_str().cmp(a.as_str())))
        .map(|(mood, count)| (*mood, *count));

    let mut sorted: Vec<&MoodLogEntry> = logs.iter().collect();
    sorted.sort_by_key(|l| l.date);

    let streak_mood = sorted.last().map(|l| l.mood);
    let streak = match streak_mood {
        Some(mood) => sorted.iter().rev().take_while(|l| l.mood == mood).count() as u32,
        None => 0,
    };

    MoodTrend {
        dominant_mood: dominant.map(|(m, _)| m),
        dominant_count: dominant.map(|(_, c)| c).unwrap_or(0),
        streak_mood,
        streak,
    }
}
