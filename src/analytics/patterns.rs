//! Attributes each mood log to the cycle phase it fell in and ranks moods per
//! phase.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::analytics::cycle::calculate_phase;
use crate::models::{CyclePhase, CycleSummary, Mood, MoodLogEntry, MoodShare, PhaseMoodPatterns, PhaseMoodSummary};

/// Position of `date` inside a repeating cycle, always within
/// `[1, cycle_length]`. Dates before `cycle_start` wrap backwards.
pub fn calculate_day_in_cycle(date: NaiveDate, cycle_start: NaiveDate, cycle_length: u32) -> Option<u32> {
    if cycle_length == 0 {
        return None;
    }
    let diff = (date - cycle_start).num_days();
    let day = diff.rem_euclid(i64::from(cycle_length)) + 1;
    u32::try_from(day).ok()
}

/// Phase used for per-log attribution. Shares its boundaries with
/// [`calculate_phase`] so the timeline and the mood patterns never disagree.
pub fn determine_cycle_phase(day_in_cycle: u32, cycle_length: u32, period_length: u32) -> CyclePhase {
    calculate_phase(day_in_cycle, period_length, cycle_length)
}

fn percentage(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(count) / f64::from(total) * 100.0).round() as u32
}

fn summarize_phase(counts: &BTreeMap<Mood, u32>) -> PhaseMoodSummary {
    let total: u32 = counts.values().sum();
    if total == 0 {
        return PhaseMoodSummary::empty();
    }

    let mut ranked: Vec<MoodShare> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(mood, count)| MoodShare {
            mood: *mood,
            count: *count,
            percentage: percentage(*count, total),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mood.as_str().cmp(b.mood.as_str())));

    let (top_mood, top_count, top_percentage) = ranked
        .first()
        .map(|top| (Some(top.mood), top.count, top.percentage))
        .unwrap_or((None, 0, 0));

    PhaseMoodSummary {
        total,
        top_mood,
        top_count,
        top_percentage,
        ranked,
    }
}

fn empty_patterns() -> PhaseMoodPatterns {
    PhaseMoodPatterns {
        has_data: false,
        phases: CyclePhase::TRACKED
            .iter()
            .map(|phase| (*phase, PhaseMoodSummary::empty()))
            .collect(),
    }
}

pub fn analyze_mood_patterns_by_phase(logs: &[MoodLogEntry], summary: &CycleSummary) -> PhaseMoodPatterns {
    let Some(cycle_start) = summary.last_period_start else {
        return empty_patterns();
    };
    if logs.is_empty() {
        return empty_patterns();
    }

    let cycle_length = summary.average_cycle_length;
    let period_length = summary.average_period_length;

    let mut tally: BTreeMap<CyclePhase, BTreeMap<Mood, u32>> = CyclePhase::TRACKED
        .iter()
        .map(|phase| (*phase, BTreeMap::new()))
        .collect();

    for log in logs {
        let Some(day) = calculate_day_in_cycle(log.date, cycle_start, cycle_length) else {
            continue;
        };
        let phase = determine_cycle_phase(day, cycle_length, period_length);
        *tally.entry(phase).or_default().entry(log.mood).or_insert(0) += 1;
    }

    let phases: BTreeMap<CyclePhase, PhaseMoodSummary> = tally
        .iter()
        .map(|(phase, counts)| (*phase, summarize_phase(counts)))
        .collect();

    PhaseMoodPatterns {
        has_data: phases.values().any(|p| p.total > 0),
        phases,
    }
}
