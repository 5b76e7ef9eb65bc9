use chrono::NaiveDate;

use crate::analytics::date_math::{add_days, diff_in_days};
use crate::models::{
    CyclePhase, CycleStat, CycleStatsReport, CycleStatus, CycleSummary, PeriodEntry, TimelineDay,
    DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH,
};

/// Start-to-start gaps outside this range are treated as missed logs.
pub const PLAUSIBLE_CYCLE_GAP: std::ops::RangeInclusive<i64> = 15..=60;
pub const PLAUSIBLE_PERIOD_LENGTH: std::ops::RangeInclusive<i64> = 1..=15;

/// 1-based day of the cycle that started on `last_period_start`.
pub fn get_cycle_day(reference: NaiveDate, last_period_start: Option<NaiveDate>) -> Option<u32> {
    let start = last_period_start?;
    let diff = diff_in_days(&start, &reference)?;
    if diff < 0 {
        return None;
    }
    u32::try_from(diff + 1).ok()
}

pub fn calculate_phase(cycle_day: u32, period_length: u32, cycle_length: u32) -> CyclePhase {
    if cycle_day <= period_length {
        return CyclePhase::Menstruation;
    }

    // widened so very long cycles cannot overflow
    let day = u64::from(cycle_day);
    let ovulation_start = (u64::from(period_length) + 1).max(u64::from(cycle_length) * 45 / 100);
    let ovulation_end = ovulation_start + 2;

    if (ovulation_start..=ovulation_end).contains(&day) {
        CyclePhase::Ovulation
    } else if day < ovulation_start {
        CyclePhase::Follicular
    } else if cycle_day <= cycle_length {
        CyclePhase::Luteal
    } else {
        CyclePhase::Unknown
    }
}

pub fn predict_next_period(last_period_start: Option<NaiveDate>, cycle_length: u32) -> Option<NaiveDate> {
    last_period_start.and_then(|start| add_days(start, i64::from(cycle_length)))
}

fn sorted_by_start(periods: &[PeriodEntry]) -> Vec<&PeriodEntry> {
    let mut sorted: Vec<&PeriodEntry> = periods.iter().collect();
    sorted.sort_by_key(|p| p.start);
    sorted
}

fn period_length_of(entry: &PeriodEntry) -> Option<i64> {
    entry.end.map(|end| (end - entry.start).num_days() + 1)
}

fn rounded_mean(values: &[i64]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<i64>() as f64 / values.len() as f64;
    u32::try_from(mean.round() as i64).ok()
}

/// Averages period and cycle lengths over the whole history.
pub fn calculate_cycle_summary(periods: &[PeriodEntry]) -> CycleSummary {
    let sorted = sorted_by_start(periods);

    let period_lengths: Vec<i64> = sorted
        .iter()
        .filter_map(|p| period_length_of(p))
        .map(|len| len.max(1))
        .collect();

    let cycle_lengths: Vec<i64> = sorted
        .windows(2)
        .map(|w| (w[1].start - w[0].start).num_days().max(1))
        .collect();

    let last = sorted.last();

    CycleSummary {
        average_cycle_length: rounded_mean(&cycle_lengths).unwrap_or(DEFAULT_CYCLE_LENGTH),
        average_period_length: rounded_mean(&period_lengths).unwrap_or(DEFAULT_PERIOD_LENGTH),
        last_period_start: last.map(|p| p.start),
        last_period_end: last.and_then(|p| p.end),
    }
}

/// Summary derived straight from logged history, ignoring implausible gaps
/// and lengths. Falls back to [`calculate_cycle_summary`] for each average it
/// cannot derive.
pub fn summary_from_history(history: &[PeriodEntry]) -> CycleSummary {
    let generic = calculate_cycle_summary(history);
    if history.len() < 2 {
        return generic;
    }

    let sorted = sorted_by_start(history);

    let gaps: Vec<i64> = sorted
        .windows(2)
        .map(|w| (w[1].start - w[0].start).num_days())
        .filter(|gap| PLAUSIBLE_CYCLE_GAP.contains(gap))
        .collect();

    let lengths: Vec<i64> = sorted
        .iter()
        .filter_map(|p| period_length_of(p))
        .filter(|len| PLAUSIBLE_PERIOD_LENGTH.contains(len))
        .collect();

    CycleSummary {
        average_cycle_length: rounded_mean(&gaps).unwrap_or(generic.average_cycle_length),
        average_period_length: rounded_mean(&lengths).unwrap_or(generic.average_period_length),
        ..generic
    }
}

/// [`summary_from_history`], but a cycle length that needs a second start and
/// a period length that needs a closed entry come from the given fallbacks
/// instead of the generic defaults.
pub fn summary_from_history_or(
    history: &[PeriodEntry],
    fallback_cycle_length: u32,
    fallback_period_length: u32,
) -> CycleSummary {
    let mut summary = summary_from_history(history);
    if history.len() < 2 {
        summary.average_cycle_length = fallback_cycle_length;
    }
    if history.iter().all(|p| p.end.is_none()) {
        summary.average_period_length = fallback_period_length;
    }
    summary
}

/// One entry per day of the cycle starting at `last_period_start`. The
/// iterator is lazy and stops early if the cycle runs off the calendar.
pub fn build_cycle_timeline(
    last_period_start: NaiveDate,
    cycle_length: u32,
    period_length: u32,
) -> impl Iterator<Item = TimelineDay> + Clone {
    (1..=cycle_length).map_while(move |day| {
        Some(TimelineDay {
            day,
            date: add_days(last_period_start, i64::from(day) - 1)?,
            phase: calculate_phase(day, period_length, cycle_length),
        })
    })
}

pub fn project_upcoming_periods(
    last_period_start: NaiveDate,
    cycles_to_project: u32,
    cycle_length: u32,
) -> Vec<NaiveDate> {
    (1..=cycles_to_project)
        .map_while(|k| add_days(last_period_start, i64::from(k) * i64::from(cycle_length)))
        .collect()
}

pub fn cycle_status(today: NaiveDate, summary: &CycleSummary) -> CycleStatus {
    let cycle_day = get_cycle_day(today, summary.last_period_start);
    let phase = cycle_day
        .map(|day| calculate_phase(day, summary.average_period_length, summary.average_cycle_length))
        .unwrap_or(CyclePhase::Unknown);
    let next_period = predict_next_period(summary.last_period_start, summary.average_cycle_length);

    CycleStatus {
        cycle_day,
        phase,
        in_fertile_window: phase == CyclePhase::Ovulation,
        next_period,
        period_expected_in_days: next_period.map(|next| (next - today).num_days()),
        start_date: summary.last_period_start,
    }
}

/// Per-cycle breakdown; the most recent cycle is still open and has no length.
pub fn cycle_stats(history: &[PeriodEntry]) -> CycleStatsReport {
    let sorted = sorted_by_start(history);

    let cycle_stats: Vec<CycleStat> = sorted
        .iter()
        .enumerate()
        .map(|(i, entry)| CycleStat {
            cycle_number: (i + 1) as u32,
            start_date: entry.start,
            period_length: period_length_of(entry).and_then(|len| u32::try_from(len).ok()),
            cycle_length: sorted
                .get(i + 1)
                .and_then(|next| u32::try_from((next.start - entry.start).num_days()).ok()),
        })
        .collect();

    let lengths = cycle_stats.iter().filter_map(|s| s.cycle_length);

    CycleStatsReport {
        shortest_cycle: lengths.clone().min(),
        longest_cycle: lengths.max(),
        cycle_stats,
    }
}
