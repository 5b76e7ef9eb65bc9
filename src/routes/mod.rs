use axum::{http::StatusCode, routing::get, Router};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;
use crate::store::AppStore;

pub mod cycle;
pub mod cycle_stats;
pub mod insights;
pub mod mood;
pub mod onboarding;
pub mod periods;

pub type SharedStore = Arc<Mutex<AppStore>>;

pub fn shared(store: AppStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

/// Every route module merged, plus `/health`.
pub fn app(store: SharedStore) -> Router {
    Router::new()
        .merge(cycle::routes(store.clone()))
        .merge(cycle_stats::routes(store.clone()))
        .merge(periods::routes(store.clone()))
        .merge(mood::routes(store.clone()))
        .merge(onboarding::routes(store.clone()))
        .merge(insights::routes(store))
        .route("/health", get(|| async { "✅ Journal up" }))
}

/// A request that panics while holding the lock poisons it; later requests
/// keep serving the store instead of failing.
pub(crate) fn lock(store: &SharedStore) -> MutexGuard<'_, AppStore> {
    store.lock().unwrap_or_else(|poisoned| {
        tracing::error!("❌ Store lock poisoned by a panicked request, recovering");
        store.clear_poison();
        poisoned.into_inner()
    })
}

pub(crate) fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::Validation(v) => (StatusCode::UNPROCESSABLE_ENTITY, v.to_string()),
        StoreError::Storage(s) => {
            tracing::error!("❌ Storage error: {}", s);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".into())
        }
    }
}
