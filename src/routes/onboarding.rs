use axum::{
    Router,
    routing::{delete, get, patch, post},
    extract::State,
    Json,
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{StorageError, StoreError};
use crate::models::OnboardingData;
use crate::routes::{lock, store_error, SharedStore};

#[derive(Serialize)]
pub struct OnboardingState {
    pub completed: bool,
    pub data: OnboardingData,
    pub draft: OnboardingData,
}

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/onboarding", get(get_onboarding))
        .route("/onboarding/draft", patch(update_draft))
        .route("/onboarding/commit", post(commit))
        .route("/data", delete(wipe_data))
        .with_state(store)
}

async fn get_onboarding(State(store): State<SharedStore>) -> Json<OnboardingState> {
    let store = lock(&store);
    Json(OnboardingState {
        completed: store.onboarding_completed(),
        data: store.onboarding().clone(),
        draft: store.draft().clone(),
    })
}

async fn update_draft(
    State(store): State<SharedStore>,
    Json(patch): Json<Value>,
) -> Result<Json<OnboardingData>, (StatusCode, String)> {
    if !patch.is_object() {
        return Err((StatusCode::BAD_REQUEST, "Draft patch must be a JSON object".into()));
    }

    let mut store = lock(&store);
    match store.update_onboarding_draft(patch) {
        Ok(draft) => Ok(Json(draft.clone())),
        Err(StoreError::Storage(StorageError::Json(e))) => {
            tracing::info!("ℹ️ Draft patch rejected: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, "Draft patch does not fit onboarding data".into()))
        }
        Err(e) => Err(store_error(e)),
    }
}

async fn commit(
    State(store): State<SharedStore>,
) -> Result<Json<OnboardingData>, (StatusCode, String)> {
    let mut store = lock(&store);
    let data = store.commit_onboarding().map_err(store_error)?;
    Ok(Json(data.clone()))
}

async fn wipe_data(
    State(store): State<SharedStore>,
) -> Result<StatusCode, (StatusCode, String)> {
    lock(&store).reset().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
