use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::analytics::cycle::cycle_stats;
use crate::models::{CycleStat, CycleSummary};
use crate::routes::{lock, SharedStore};

#[derive(Serialize)]
pub struct CycleStatsResponse {
    average_period_length: u32,
    average_cycle_length: u32,
    shortest_cycle: Option<u32>,
    longest_cycle: Option<u32>,
    cycle_stats: Vec<CycleStat>,
}

pub async fn get_cycle_stats(State(store): State<SharedStore>) -> Json<CycleStatsResponse> {
    let store = lock(&store);
    let CycleSummary { average_cycle_length, average_period_length, .. } = store.cycle_summary();
    let report = cycle_stats(store.period_history());

    Json(CycleStatsResponse {
        average_period_length,
        average_cycle_length,
        shortest_cycle: report.shortest_cycle,
        longest_cycle: report.longest_cycle,
        cycle_stats: report.cycle_stats,
    })
}

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/cycle-stats", get(get_cycle_stats))
        .with_state(store)
}
