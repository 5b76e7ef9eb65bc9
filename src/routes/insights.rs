use axum::{extract::State, routing::get, Json, Router};

use crate::models::{EarnedAchievement, Insights};
use crate::routes::{lock, SharedStore};

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/insights", get(get_insights))
        .route("/achievements", get(get_achievements))
        .with_state(store)
}

async fn get_insights(State(store): State<SharedStore>) -> Json<Insights> {
    Json(lock(&store).insights())
}

async fn get_achievements(State(store): State<SharedStore>) -> Json<Vec<EarnedAchievement>> {
    Json(lock(&store).achievements())
}
