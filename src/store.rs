//! The device's single store. Raw entities (onboarding data with its period
//! history, and mood logs keyed by day) are the only state; every derived
//! value is recomputed from them on read.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::analytics::achievements::{evaluate_achievements, AchievementContext};
use crate::analytics::cycle::{calculate_cycle_summary, cycle_status, summary_from_history_or};
use crate::analytics::date_math::{self, to_date};
use crate::analytics::mood::{calculate_mood_distribution, normalize_mood_entry, summarize_mood_trend, DEFAULT_WINDOW_DAYS};
use crate::analytics::patterns::analyze_mood_patterns_by_phase;
use crate::analytics::streak::{calculate_consistency, calculate_streak};
use crate::error::{StorageError, StoreError, ValidationError};
use crate::models::{
    CycleSummary, EarnedAchievement, Insights, MoodLogEntry, OnboardingData, PeriodEntry, PeriodInput,
    RawMoodEntry, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH, MAX_LENGTH_DAYS,
};
use crate::storage::{keys, Persistence};

pub struct AppStore {
    persistence: Persistence,
    clock: fn() -> NaiveDate,
    onboarding: OnboardingData,
    draft: OnboardingData,
    onboarding_completed: bool,
    mood_logs: BTreeMap<NaiveDate, MoodLogEntry>,
}

fn parse_required(value: &str) -> Result<NaiveDate, ValidationError> {
    to_date(value).ok_or_else(|| ValidationError::InvalidDate(value.to_string()))
}

fn check_pain_scale(value: i64) -> Result<u8, ValidationError> {
    if (1..=10).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::PainScaleOutOfRange(value))
    }
}

fn check_length(field: &'static str, value: u32) -> Result<(), ValidationError> {
    match value {
        0 => Err(ValidationError::NonPositiveLength(field)),
        v if v > MAX_LENGTH_DAYS => Err(ValidationError::LengthTooLong(field, MAX_LENGTH_DAYS)),
        _ => Ok(()),
    }
}

/// Drops stored periods that `add_period` would refuse: future dates, an end
/// before the start, or an overlap with an earlier entry.
fn sanitize_history(mut history: Vec<PeriodEntry>, today: NaiveDate) -> Vec<PeriodEntry> {
    history.sort_by_key(|p| p.start);

    let mut kept: Vec<PeriodEntry> = Vec::with_capacity(history.len());
    for mut entry in history {
        let reversed = entry.end.is_some_and(|end| end < entry.start);
        let overlaps = kept.last().is_some_and(|prev| entry.start <= prev.last_day());
        if reversed || entry.last_day() > today || overlaps {
            tracing::warn!("⚠️ Dropping stored period starting {}: invalid or overlapping", entry.start);
            continue;
        }
        if entry.pain_scale.is_some_and(|pain| check_pain_scale(i64::from(pain)).is_err()) {
            entry.pain_scale = None;
        }
        kept.push(entry);
    }
    kept
}

/// Stored lengths outside what a commit accepts read back as the defaults.
fn sanitize_lengths(onboarding: &mut OnboardingData) {
    if check_length("Cycle length", onboarding.cycle_length).is_err() {
        tracing::warn!("⚠️ Stored cycle length {} ignored", onboarding.cycle_length);
        onboarding.cycle_length = DEFAULT_CYCLE_LENGTH;
    }
    if check_length("Period length", onboarding.period_length).is_err() {
        tracing::warn!("⚠️ Stored period length {} ignored", onboarding.period_length);
        onboarding.period_length = DEFAULT_PERIOD_LENGTH;
    }
}

impl AppStore {
    /// Loads every key from `persistence`, substituting defaults for
    /// anything missing or invalid.
    pub fn load(persistence: Persistence) -> Self {
        Self::load_with_clock(persistence, date_math::today)
    }

    pub fn load_with_clock(persistence: Persistence, clock: fn() -> NaiveDate) -> Self {
        let mut onboarding = persistence.get(&keys::ONBOARDING);
        onboarding.period_history = sanitize_history(std::mem::take(&mut onboarding.period_history), clock());
        sanitize_lengths(&mut onboarding);

        let mood_logs: BTreeMap<NaiveDate, MoodLogEntry> = persistence
            .get(&keys::MOOD_LOGS)
            .iter()
            .filter_map(normalize_mood_entry)
            .map(|entry| (entry.date, entry))
            .collect();

        let draft = persistence.get(&keys::ONBOARDING_DRAFT);
        let onboarding_completed = persistence.get(&keys::ONBOARDING_COMPLETED);

        tracing::info!(
            "📂 Loaded store: {} periods, {} mood logs",
            onboarding.period_history.len(),
            mood_logs.len()
        );

        Self {
            persistence,
            clock,
            onboarding,
            draft,
            onboarding_completed,
            mood_logs,
        }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn onboarding(&self) -> &OnboardingData {
        &self.onboarding
    }

    pub fn draft(&self) -> &OnboardingData {
        &self.draft
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn period_history(&self) -> &[PeriodEntry] {
        &self.onboarding.period_history
    }

    /// Mood logs in ascending date order.
    pub fn mood_logs(&self) -> Vec<MoodLogEntry> {
        self.mood_logs.values().cloned().collect()
    }

    fn persist_onboarding(&mut self) -> Result<(), StorageError> {
        self.persistence.set(&keys::ONBOARDING, &self.onboarding)?;
        self.persistence.set(&keys::ONBOARDING_COMPLETED, &self.onboarding_completed)
    }

    fn persist_mood_logs(&mut self) -> Result<(), StorageError> {
        let raw: Vec<RawMoodEntry> = self.mood_logs.values().map(RawMoodEntry::from).collect();
        self.persistence.set(&keys::MOOD_LOGS, &raw)
    }

    fn validate_period(&self, input: &PeriodInput) -> Result<PeriodEntry, ValidationError> {
        let today = self.today();

        let start = match input.start.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => parse_required(s)?,
            _ => return Err(ValidationError::MissingStart),
        };
        if start > today {
            return Err(ValidationError::StartInFuture(start));
        }

        let end = match input.end.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_required(s)?),
            _ => None,
        };
        if let Some(end) = end {
            if end > today {
                return Err(ValidationError::EndInFuture(end));
            }
            if end < start {
                return Err(ValidationError::EndBeforeStart { start, end });
            }
        }

        let pain_scale = input.pain_scale.map(check_pain_scale).transpose()?;
        let candidate = PeriodEntry { start, end, pain_scale };

        let history = &self.onboarding.period_history;
        if history.iter().any(|p| p.start == start) {
            return Err(ValidationError::DuplicateStart(start));
        }
        let last_day = candidate.last_day();
        if history.iter().any(|p| start <= p.last_day() && p.start <= last_day) {
            return Err(ValidationError::Overlap { start, end: last_day });
        }

        Ok(candidate)
    }

    /// Validates and inserts a period, keeping history sorted by start, and
    /// marks onboarding as done.
    pub fn add_period(&mut self, input: PeriodInput) -> Result<PeriodEntry, StoreError> {
        let entry = self.validate_period(&input)?;

        let history = &mut self.onboarding.period_history;
        let at = history.partition_point(|p| p.start < entry.start);
        history.insert(at, entry.clone());

        let summary = self.cycle_summary();
        self.onboarding.last_period_start = summary.last_period_start;
        self.onboarding.last_period_end = summary.last_period_end;
        self.onboarding_completed = true;
        self.persist_onboarding()?;

        tracing::info!("🩸 Period logged starting {}", entry.start);
        Ok(entry)
    }

    /// Upserts a mood log for its day; a later write replaces the earlier one.
    pub fn add_mood_log(&mut self, raw: RawMoodEntry) -> Result<MoodLogEntry, StoreError> {
        let Some(entry) = normalize_mood_entry(&raw) else {
            let value = raw.date.clone().unwrap_or_default();
            return Err(ValidationError::InvalidDate(value).into());
        };
        if entry.date > self.today() {
            return Err(ValidationError::MoodInFuture(entry.date).into());
        }

        let replaced = self.mood_logs.insert(entry.date, entry.clone()).is_some();
        self.persist_mood_logs()?;

        tracing::info!("📝 Mood {} logged for {} (replaced: {})", entry.mood.as_str(), entry.date, replaced);
        Ok(entry)
    }

    /// Returns whether a log existed for that day.
    pub fn remove_mood_log(&mut self, date: NaiveDate) -> Result<bool, StoreError> {
        if self.mood_logs.remove(&date).is_none() {
            return Ok(false);
        }
        self.persist_mood_logs()?;
        tracing::info!("🗑️ Mood log removed for {}", date);
        Ok(true)
    }

    /// Merges a partial onboarding patch into the draft.
    pub fn update_onboarding_draft(&mut self, patch: Value) -> Result<&OnboardingData, StoreError> {
        self.draft = self.persistence.merge(&keys::ONBOARDING_DRAFT, patch)?;
        Ok(&self.draft)
    }

    fn validate_draft(&self) -> Result<(), ValidationError> {
        let today = self.today();
        let draft = &self.draft;

        check_length("Cycle length", draft.cycle_length)?;
        check_length("Period length", draft.period_length)?;
        if let Some(pain) = draft.pain_scale {
            check_pain_scale(i64::from(pain))?;
        }
        if let Some(start) = draft.last_period_start {
            if start > today {
                return Err(ValidationError::StartInFuture(start));
            }
            if let Some(end) = draft.last_period_end {
                if end > today {
                    return Err(ValidationError::EndInFuture(end));
                }
                if end < start {
                    return Err(ValidationError::EndBeforeStart { start, end });
                }
            }
        }
        Ok(())
    }

    /// Promotes the draft to the committed onboarding data. Period history
    /// already logged is kept.
    pub fn commit_onboarding(&mut self) -> Result<&OnboardingData, StoreError> {
        self.validate_draft()?;

        let history = std::mem::take(&mut self.onboarding.period_history);
        self.onboarding = OnboardingData {
            period_history: history,
            ..self.draft.clone()
        };
        self.onboarding_completed = true;
        self.persist_onboarding()?;
        self.persistence.remove(&keys::ONBOARDING_DRAFT)?;
        self.draft = OnboardingData::default();

        tracing::info!("✅ Onboarding committed");
        Ok(&self.onboarding)
    }

    /// User-initiated wipe back to a fresh install.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.persistence.clear_all()?;
        self.onboarding = OnboardingData::default();
        self.draft = OnboardingData::default();
        self.onboarding_completed = false;
        self.mood_logs.clear();
        tracing::info!("🧹 All data wiped");
        Ok(())
    }

    /// Logged history wins; the onboarding answers fill whatever it cannot
    /// tell yet, and stand in entirely when nothing is logged.
    pub fn cycle_summary(&self) -> CycleSummary {
        let history = &self.onboarding.period_history;
        if !history.is_empty() {
            return summary_from_history_or(history, self.onboarding.cycle_length, self.onboarding.period_length);
        }
        if self.onboarding.last_period_start.is_none() {
            return calculate_cycle_summary(history);
        }
        CycleSummary {
            average_cycle_length: self.onboarding.cycle_length,
            average_period_length: self.onboarding.period_length,
            last_period_start: self.onboarding.last_period_start,
            last_period_end: self.onboarding.last_period_end,
        }
    }

    fn achievement_context<'a>(
        &'a self,
        logs: &'a [MoodLogEntry],
        cycle_summary: &'a CycleSummary,
        today: NaiveDate,
    ) -> AchievementContext<'a> {
        AchievementContext {
            mood_logs: logs,
            streak: calculate_streak(logs, today),
            consistency: calculate_consistency(logs, today),
            cycle_summary,
            onboarding_completed: self.onboarding_completed,
            onboarding: &self.onboarding,
            today,
        }
    }

    /// Only what the rules read is computed here.
    pub fn achievements(&self) -> Vec<EarnedAchievement> {
        let today = self.today();
        let logs = self.mood_logs();
        let cycle_summary = self.cycle_summary();
        evaluate_achievements(&self.achievement_context(&logs, &cycle_summary, today))
    }

    pub fn insights(&self) -> Insights {
        let today = self.today();
        let logs = self.mood_logs();
        let cycle_summary = self.cycle_summary();
        let ctx = self.achievement_context(&logs, &cycle_summary, today);
        let (streak, consistency) = (ctx.streak, ctx.consistency);
        let achievements = evaluate_achievements(&ctx);

        Insights {
            cycle_status: cycle_status(today, &cycle_summary),
            mood_distribution: calculate_mood_distribution(&logs, DEFAULT_WINDOW_DAYS, today),
            mood_trend: summarize_mood_trend(&logs),
            mood_patterns: analyze_mood_patterns_by_phase(&logs, &cycle_summary),
            cycle_summary,
            streak,
            consistency,
            achievements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use serde_json::json;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    fn store() -> AppStore {
        AppStore::load_with_clock(Persistence::in_memory(), fixed_today)
    }

    fn period(start: &str, end: Option<&str>) -> PeriodInput {
        PeriodInput {
            start: Some(start.to_string()),
            end: end.map(str::to_string),
            pain_scale: None,
        }
    }

    fn mood(date: &str, mood: &str) -> RawMoodEntry {
        RawMoodEntry {
            date: Some(date.to_string()),
            mood: Some(mood.to_string()),
            ..RawMoodEntry::default()
        }
    }

    fn validation(err: StoreError) -> ValidationError {
        match err {
            StoreError::Validation(v) => v,
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn add_period_keeps_history_sorted_and_completes_onboarding() {
        let mut store = store();
        assert!(!store.onboarding_completed());

        store.add_period(period("2025-02-20", Some("2025-02-24"))).unwrap();
        store.add_period(period("2025-01-23", Some("2025-01-27"))).unwrap();
        store.add_period(period("2025-03-19", None)).unwrap();

        let starts: Vec<String> = store
            .period_history()
            .iter()
            .map(|p| date_math::format_iso_date(p.start))
            .collect();
        assert_eq!(starts, vec!["2025-01-23", "2025-02-20", "2025-03-19"]);
        assert!(store.onboarding_completed());

        let summary = store.cycle_summary();
        assert_eq!(summary.average_cycle_length, 28);
        assert_eq!(summary.average_period_length, 5);
        assert_eq!(store.onboarding().last_period_start, summary.last_period_start);
    }

    #[test]
    fn add_period_rejects_bad_input() {
        let mut store = store();
        store.add_period(period("2025-02-20", Some("2025-02-24"))).unwrap();

        let cases = [
            (PeriodInput::default(), ValidationError::MissingStart),
            (period("2025-13-01", None), ValidationError::InvalidDate("2025-13-01".into())),
            (
                period("2025-03-21", None),
                ValidationError::StartInFuture(NaiveDate::from_ymd_opt(2025, 3, 21).unwrap()),
            ),
            (
                period("2025-03-10", Some("2025-03-25")),
                ValidationError::EndInFuture(NaiveDate::from_ymd_opt(2025, 3, 25).unwrap()),
            ),
            (
                period("2025-03-10", Some("2025-03-05")),
                ValidationError::EndBeforeStart {
                    start: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                    end: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                },
            ),
            (
                period("2025-02-20", None),
                ValidationError::DuplicateStart(NaiveDate::from_ymd_opt(2025, 2, 20).unwrap()),
            ),
            (
                period("2025-02-18", Some("2025-02-21")),
                ValidationError::Overlap {
                    start: NaiveDate::from_ymd_opt(2025, 2, 18).unwrap(),
                    end: NaiveDate::from_ymd_opt(2025, 2, 21).unwrap(),
                },
            ),
            (
                period("2025-02-24", None),
                ValidationError::Overlap {
                    start: NaiveDate::from_ymd_opt(2025, 2, 24).unwrap(),
                    end: NaiveDate::from_ymd_opt(2025, 2, 24).unwrap(),
                },
            ),
        ];

        for (input, expected) in cases {
            let err = store.add_period(input).unwrap_err();
            assert_eq!(validation(err), expected);
        }

        let mut bad_pain = period("2025-01-10", None);
        bad_pain.pain_scale = Some(11);
        assert_eq!(
            validation(store.add_period(bad_pain).unwrap_err()),
            ValidationError::PainScaleOutOfRange(11)
        );
        assert_eq!(store.period_history().len(), 1);
    }

    #[test]
    fn mood_logs_upsert_by_day() {
        let mut store = store();
        store.add_mood_log(mood("2025-03-19", "happy")).unwrap();
        store.add_mood_log(mood("2025-03-19", "sad")).unwrap();
        store.add_mood_log(mood("2025-03-18", "angry")).unwrap();

        let logs = store.mood_logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].mood, Mood::Sad);

        assert!(store.add_mood_log(mood("2025-03-21", "happy")).is_err());
        assert!(store.add_mood_log(mood("soon", "happy")).is_err());

        assert!(store.remove_mood_log(NaiveDate::from_ymd_opt(2025, 3, 18).unwrap()).unwrap());
        assert!(!store.remove_mood_log(NaiveDate::from_ymd_opt(2025, 3, 18).unwrap()).unwrap());
        assert_eq!(store.mood_logs().len(), 1);
    }

    #[test]
    fn onboarding_draft_commit_and_reset() {
        let mut store = store();
        store
            .update_onboarding_draft(json!({ "last_period_start": "2025-03-01", "cycle_length": 30 }))
            .unwrap();
        store.update_onboarding_draft(json!({ "period_length": 4 })).unwrap();
        assert!(!store.onboarding_completed());

        store.commit_onboarding().unwrap();
        assert!(store.onboarding_completed());
        assert_eq!(store.onboarding().cycle_length, 30);
        assert_eq!(store.onboarding().period_length, 4);

        let summary = store.cycle_summary();
        assert_eq!(summary.average_cycle_length, 30);
        assert_eq!(summary.last_period_start, NaiveDate::from_ymd_opt(2025, 3, 1));

        store.reset().unwrap();
        assert!(!store.onboarding_completed());
        assert_eq!(store.onboarding(), &OnboardingData::default());
    }

    #[test]
    fn commit_rejects_invalid_draft() {
        let mut store = store();
        store.update_onboarding_draft(json!({ "cycle_length": 0 })).unwrap();
        assert_eq!(
            validation(store.commit_onboarding().unwrap_err()),
            ValidationError::NonPositiveLength("Cycle length")
        );
        assert!(!store.onboarding_completed());

        store.update_onboarding_draft(json!({ "cycle_length": 200_000_000 })).unwrap();
        assert_eq!(
            validation(store.commit_onboarding().unwrap_err()),
            ValidationError::LengthTooLong("Cycle length", MAX_LENGTH_DAYS)
        );
        store.update_onboarding_draft(json!({ "cycle_length": 28, "period_length": 400 })).unwrap();
        assert_eq!(
            validation(store.commit_onboarding().unwrap_err()),
            ValidationError::LengthTooLong("Period length", MAX_LENGTH_DAYS)
        );
        assert!(!store.onboarding_completed());
        assert_eq!(store.insights().cycle_summary, CycleSummary::default());
    }

    #[test]
    fn first_logged_period_keeps_onboarding_lengths() {
        let mut store = store();
        store
            .update_onboarding_draft(json!({ "cycle_length": 32, "period_length": 6 }))
            .unwrap();
        store.commit_onboarding().unwrap();

        store.add_period(period("2025-03-10", None)).unwrap();
        let summary = store.cycle_summary();
        assert_eq!(summary.average_cycle_length, 32);
        assert_eq!(summary.average_period_length, 6);
        assert_eq!(summary.last_period_start, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(
            store.insights().cycle_status.next_period,
            NaiveDate::from_ymd_opt(2025, 4, 11)
        );

        store.add_period(period("2025-02-08", Some("2025-02-11"))).unwrap();
        let summary = store.cycle_summary();
        assert_eq!(summary.average_cycle_length, 30);
        assert_eq!(summary.average_period_length, 4);
    }

    #[test]
    fn achievements_agree_with_insights() {
        let mut store = store();
        assert!(store.achievements().is_empty());

        store.add_period(period("2025-03-01", None)).unwrap();
        for day in 10..=19 {
            store.add_mood_log(mood(&format!("2025-03-{day}"), "normal")).unwrap();
        }
        assert_eq!(store.achievements(), store.insights().achievements);
        assert_eq!(store.achievements().len(), 2);
    }

    #[test]
    fn stored_history_is_checked_on_load() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let entry = |start: &str, end: Option<&str>, pain: Option<u8>| PeriodEntry {
            start: d(start),
            end: end.map(d),
            pain_scale: pain,
        };

        let mut persistence = Persistence::in_memory();
        let stored = OnboardingData {
            cycle_length: 0,
            period_length: 1_000,
            period_history: vec![
                entry("2025-02-20", Some("2025-02-24"), Some(0)),
                entry("2025-01-01", Some("2025-01-05"), Some(3)),
                entry("2025-01-03", Some("2025-01-07"), None),
                entry("2025-01-01", None, None),
                entry("2025-02-10", Some("2025-02-05"), None),
                entry("2025-03-15", Some("2025-03-25"), None),
                entry("2025-04-01", None, None),
            ],
            ..OnboardingData::default()
        };
        persistence.set(&keys::ONBOARDING, &stored).unwrap();

        let mut store = AppStore::load_with_clock(persistence, fixed_today);
        let history = store.period_history().to_vec();
        assert_eq!(
            history,
            vec![
                entry("2025-01-01", Some("2025-01-05"), Some(3)),
                entry("2025-02-20", Some("2025-02-24"), None),
            ]
        );
        assert_eq!(store.onboarding().cycle_length, DEFAULT_CYCLE_LENGTH);
        assert_eq!(store.onboarding().period_length, DEFAULT_PERIOD_LENGTH);

        assert!(store.add_period(period("2025-01-03", None)).is_err());
        store.add_period(period("2025-03-15", Some("2025-03-19"))).unwrap();
        assert_eq!(store.cycle_summary().average_cycle_length, 37);
    }

    #[test]
    fn state_survives_reload_from_the_same_backend() {
        let mut first = store();
        first.add_period(period("2025-02-20", Some("2025-02-24"))).unwrap();
        first.add_mood_log(mood("2025-03-19", "anxious")).unwrap();

        let AppStore { persistence, .. } = first;
        let reloaded = AppStore::load_with_clock(persistence, fixed_today);
        assert_eq!(reloaded.period_history().len(), 1);
        assert_eq!(reloaded.mood_logs()[0].mood, Mood::Anxious);
        assert!(reloaded.onboarding_completed());
    }

    #[test]
    fn insights_are_derived_from_raw_logs() {
        let mut store = store();
        store.add_period(period("2025-03-01", Some("2025-03-05"))).unwrap();
        for day in 13..=20 {
            store.add_mood_log(mood(&format!("2025-03-{day}"), "happy")).unwrap();
        }

        let insights = store.insights();
        assert_eq!(insights.streak, 8);
        assert_eq!(insights.consistency, 27);
        assert_eq!(insights.cycle_status.cycle_day, Some(20));
        assert_eq!(insights.mood_distribution[&Mood::Happy], 8);
        assert!(insights.mood_patterns.has_data);
        let ids: Vec<&str> = insights.achievements.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["streak_7", "cycle_predictor"]);
    }
}
