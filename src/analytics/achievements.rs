use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use crate::models::{CycleSummary, EarnedAchievement, MoodLogEntry, OnboardingData};

pub const MONTHLY_LOG_TARGET: usize = 20;

/// Everything an achievement rule may look at.
pub struct AchievementContext<'a> {
    pub mood_logs: &'a [MoodLogEntry],
    pub streak: u32,
    pub consistency: u32,
    pub cycle_summary: &'a CycleSummary,
    pub onboarding_completed: bool,
    pub onboarding: &'a OnboardingData,
    pub today: NaiveDate,
}

pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub condition: fn(&AchievementContext<'_>) -> bool,
}

impl Achievement {
    fn earned(&self) -> EarnedAchievement {
        EarnedAchievement {
            id: self.id,
            title: self.title,
            description: self.description,
        }
    }
}

fn logged_days_this_month(ctx: &AchievementContext<'_>) -> usize {
    ctx.mood_logs
        .iter()
        .filter(|log| log.date.year() == ctx.today.year() && log.date.month() == ctx.today.month())
        .map(|log| log.date)
        .collect::<BTreeSet<_>>()
        .len()
}

pub static ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "streak_7",
        title: "One Week Strong",
        description: "Logged your mood 7 days in a row",
        condition: |ctx| ctx.streak >= 7,
    },
    Achievement {
        id: "streak_30",
        title: "Monthly Habit",
        description: "Logged your mood 30 days in a row",
        condition: |ctx| ctx.streak >= 30,
    },
    Achievement {
        id: "cycle_predictor",
        title: "Cycle Predictor",
        description: "Completed onboarding with enough data to predict your next period",
        condition: |ctx| {
            ctx.onboarding_completed
                && ctx
                    .cycle_summary
                    .last_period_start
                    .or(ctx.onboarding.last_period_start)
                    .is_some()
                && ctx.cycle_summary.average_cycle_length > 0
                && ctx.cycle_summary.average_period_length > 0
        },
    },
    Achievement {
        id: "monthly_mood_master",
        title: "Mood Master",
        description: "Logged your mood on 20 different days this month",
        condition: |ctx| logged_days_this_month(ctx) >= MONTHLY_LOG_TARGET,
    },
];

/// Runs each rule on its own; a rule that panics is logged and left unearned.
pub fn evaluate_rules(rules: &[Achievement], ctx: &AchievementContext<'_>) -> Vec<EarnedAchievement> {
    rules
        .iter()
        .filter(|rule| match panic::catch_unwind(AssertUnwindSafe(|| (rule.condition)(ctx))) {
            Ok(earned) => earned,
            Err(_) => {
                tracing::warn!("⚠️ Achievement rule {} failed, treating as unearned", rule.id);
                false
            }
        })
        .map(Achievement::earned)
        .collect()
}

pub fn evaluate_achievements(ctx: &AchievementContext<'_>) -> Vec<EarnedAchievement> {
    evaluate_rules(ACHIEVEMENTS, ctx)
}
