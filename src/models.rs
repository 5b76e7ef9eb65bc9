use serde::{ Serialize, Deserialize };
use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::analytics::date_math::format_iso_date;

pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;
/// Upper bound for a committed cycle or period length.
pub const MAX_LENGTH_DAYS: u32 = 365;
pub const MAX_SYMPTOMS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEntry {
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub pain_scale: Option<u8>,
}

impl PeriodEntry {
    /// Last day covered by this entry; an open entry covers only its start.
    pub fn last_day(&self) -> NaiveDate {
        self.end.unwrap_or(self.start)
    }
}

/// Unvalidated period input as it arrives from the UI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodInput {
    pub start: Option<String>,
    pub end: Option<String>,
    pub pain_scale: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Anxious,
    Normal,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Sad, Mood::Angry, Mood::Anxious, Mood::Normal];
    pub const FALLBACK: Mood = Mood::Normal;

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Anxious => "anxious",
            Mood::Normal => "normal",
        }
    }

    /// Case-insensitive lookup; anything outside the vocabulary is `None`.
    pub fn parse(value: &str) -> Option<Mood> {
        let value = value.trim().to_lowercase();
        Mood::ALL.into_iter().find(|m| m.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodLogEntry {
    pub date: NaiveDate,
    pub mood: Mood,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

/// Mood log as stored or submitted, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMoodEntry {
    pub date: Option<String>,
    pub mood: Option<String>,
    pub note: Option<String>,
    pub symptoms: Option<Vec<String>>,
}

impl From<&MoodLogEntry> for RawMoodEntry {
    fn from(entry: &MoodLogEntry) -> Self {
        RawMoodEntry {
            date: Some(format_iso_date(entry.date)),
            mood: Some(entry.mood.as_str().to_string()),
            note: entry.note.clone(),
            symptoms: Some(entry.symptoms.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
    Unknown,
}

impl CyclePhase {
    /// Phases a day inside `[1, cycle_length]` can land in.
    pub const TRACKED: [CyclePhase; 4] = [
        CyclePhase::Menstruation,
        CyclePhase::Follicular,
        CyclePhase::Ovulation,
        CyclePhase::Luteal,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub average_cycle_length: u32,
    pub average_period_length: u32,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

impl Default for CycleSummary {
    fn default() -> Self {
        CycleSummary {
            average_cycle_length: DEFAULT_CYCLE_LENGTH,
            average_period_length: DEFAULT_PERIOD_LENGTH,
            last_period_start: None,
            last_period_end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatus {
    pub cycle_day: Option<u32>,
    pub phase: CyclePhase,
    pub in_fertile_window: bool,
    pub next_period: Option<NaiveDate>,
    pub period_expected_in_days: Option<i64>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineDay {
    pub day: u32,
    pub date: NaiveDate,
    pub phase: CyclePhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStat {
    pub cycle_number: u32,
    pub start_date: NaiveDate,
    pub period_length: Option<u32>,
    pub cycle_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatsReport {
    pub shortest_cycle: Option<u32>,
    pub longest_cycle: Option<u32>,
    pub cycle_stats: Vec<CycleStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regularity {
    Regular,
    Irregular,
    NotSure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingData {
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
    pub cycle_length: u32,
    pub period_length: u32,
    pub regularity: Option<Regularity>,
    pub pain_scale: Option<u8>,
    pub birth_year: Option<i32>,
    pub goals: Vec<String>,
    pub period_history: Vec<PeriodEntry>,
}

impl Default for OnboardingData {
    fn default() -> Self {
        OnboardingData {
            last_period_start: None,
            last_period_end: None,
            cycle_length: DEFAULT_CYCLE_LENGTH,
            period_length: DEFAULT_PERIOD_LENGTH,
            regularity: None,
            pain_scale: None,
            birth_year: None,
            goals: Vec::new(),
            period_history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodTrend {
    pub dominant_mood: Option<Mood>,
    pub dominant_count: u32,
    pub streak_mood: Option<Mood>,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodShare {
    pub mood: Mood,
    pub count: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseMoodSummary {
    pub total: u32,
    pub top_mood: Option<Mood>,
    pub top_count: u32,
    pub top_percentage: u32,
    pub ranked: Vec<MoodShare>,
}

impl PhaseMoodSummary {
    pub fn empty() -> Self {
        PhaseMoodSummary {
            total: 0,
            top_mood: None,
            top_count: 0,
            top_percentage: 0,
            ranked: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseMoodPatterns {
    pub has_data: bool,
    pub phases: BTreeMap<CyclePhase, PhaseMoodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarnedAchievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub cycle_summary: CycleSummary,
    pub cycle_status: CycleStatus,
    pub mood_distribution: BTreeMap<Mood, u32>,
    pub mood_trend: MoodTrend,
    pub mood_patterns: PhaseMoodPatterns,
    pub streak: u32,
    pub consistency: u32,
    pub achievements: Vec<EarnedAchievement>,
}
