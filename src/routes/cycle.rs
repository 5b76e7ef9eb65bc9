use axum::{Router, routing::get, Json, extract::{State, Query}};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::analytics::cycle::{build_cycle_timeline, cycle_status, project_upcoming_periods};
use crate::models::{CycleStatus, TimelineDay};
use crate::routes::{lock, SharedStore};

const DEFAULT_CYCLES_TO_PROJECT: u32 = 3;
const MAX_CYCLES_TO_PROJECT: u32 = 24;

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub count: Option<u32>,
}

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_status))
        .route("/cycle/timeline", get(get_cycle_timeline))
        .route("/cycle/upcoming", get(get_upcoming_periods))
        .with_state(store)
}

async fn get_cycle_status(State(store): State<SharedStore>) -> Json<CycleStatus> {
    let store = lock(&store);
    Json(cycle_status(store.today(), &store.cycle_summary()))
}

async fn get_cycle_timeline(
    State(store): State<SharedStore>,
) -> Result<Json<Vec<TimelineDay>>, (StatusCode, String)> {
    let summary = lock(&store).cycle_summary();
    let Some(start) = summary.last_period_start else {
        return Err((StatusCode::NOT_FOUND, "No period logged yet".into()));
    };

    let timeline = build_cycle_timeline(start, summary.average_cycle_length, summary.average_period_length);
    Ok(Json(timeline.collect()))
}

async fn get_upcoming_periods(
    State(store): State<SharedStore>,
    Query(params): Query<UpcomingQuery>,
) -> Result<Json<Vec<NaiveDate>>, (StatusCode, String)> {
    let summary = lock(&store).cycle_summary();
    let Some(start) = summary.last_period_start else {
        return Err((StatusCode::NOT_FOUND, "No period logged yet".into()));
    };

    let count = params
        .count
        .unwrap_or(DEFAULT_CYCLES_TO_PROJECT)
        .min(MAX_CYCLES_TO_PROJECT);
    Ok(Json(project_upcoming_periods(start, count, summary.average_cycle_length)))
}
