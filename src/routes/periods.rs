use axum::{extract::State, Json, Router, routing::get};
use axum::http::StatusCode;

use crate::models::{PeriodEntry, PeriodInput};
use crate::routes::{lock, store_error, SharedStore};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/periods", get(get_period_history))
        .route("/period", axum::routing::post(add_period))
        .with_state(store)
}

async fn get_period_history(State(store): State<SharedStore>) -> Json<Vec<PeriodEntry>> {
    Json(lock(&store).period_history().to_vec())
}

async fn add_period(
    State(store): State<SharedStore>,
    Json(body): Json<PeriodInput>,
) -> Result<(StatusCode, Json<PeriodEntry>), (StatusCode, String)> {
    let entry = lock(&store).add_period(body).map_err(|e| {
        tracing::info!("ℹ️ Period rejected: {}", e);
        store_error(e)
    })?;

    Ok((StatusCode::CREATED, Json(entry)))
}
