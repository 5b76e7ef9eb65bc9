use axum::{
    Router,
    routing::{get, post},
    extract::{State, Query},
    Json,
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::analytics::mood::{calculate_mood_distribution, summarize_mood_trend, DEFAULT_WINDOW_DAYS};
use crate::analytics::patterns::analyze_mood_patterns_by_phase;
use crate::models::{Mood, MoodLogEntry, MoodTrend, PhaseMoodPatterns, RawMoodEntry};
use crate::routes::{lock, store_error, SharedStore};

#[derive(Debug, Deserialize)]
pub struct DeleteMoodRequest {
    pub date: String,
}

#[derive(Deserialize)]
pub struct DistributionQuery {
    pub days: Option<u32>,
}

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/mood", post(log_mood).delete(delete_mood))
        .route("/moods", get(get_moods))
        .route("/mood/distribution", get(get_mood_distribution))
        .route("/mood/trend", get(get_mood_trend))
        .route("/mood/patterns", get(get_mood_patterns))
        .with_state(store)
}

async fn log_mood(
    State(store): State<SharedStore>,
    Json(body): Json<RawMoodEntry>,
) -> Result<(StatusCode, Json<MoodLogEntry>), (StatusCode, String)> {
    let entry = lock(&store).add_mood_log(body).map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_mood(
    State(store): State<SharedStore>,
    Json(payload): Json<DeleteMoodRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let date = match NaiveDate::parse_from_str(&payload.date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return Err((StatusCode::BAD_REQUEST, "Invalid date format (expected YYYY-MM-DD)".into())),
    };

    match lock(&store).remove_mood_log(date) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err((StatusCode::NOT_FOUND, "No mood log found".into())),
        Err(e) => Err(store_error(e)),
    }
}

async fn get_moods(State(store): State<SharedStore>) -> Json<Vec<MoodLogEntry>> {
    Json(lock(&store).mood_logs())
}

async fn get_mood_distribution(
    State(store): State<SharedStore>,
    Query(query): Query<DistributionQuery>,
) -> Json<BTreeMap<Mood, u32>> {
    let store = lock(&store);
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    Json(calculate_mood_distribution(&store.mood_logs(), days, store.today()))
}

async fn get_mood_trend(State(store): State<SharedStore>) -> Json<MoodTrend> {
    Json(summarize_mood_trend(&lock(&store).mood_logs()))
}

async fn get_mood_patterns(State(store): State<SharedStore>) -> Json<PhaseMoodPatterns> {
    let store = lock(&store);
    Json(analyze_mood_patterns_by_phase(&store.mood_logs(), &store.cycle_summary()))
}
