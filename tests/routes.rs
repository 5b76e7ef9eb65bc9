use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use joycycles_journal::routes;
use joycycles_journal::storage::Persistence;
use joycycles_journal::store::AppStore;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
}

fn app() -> Router {
    let store = AppStore::load_with_clock(Persistence::in_memory(), fixed_today);
    routes::app(routes::shared(store))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_check_responds() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn period_logging_flow() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/cycle/timeline", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/period",
        Some(json!({ "start": "2025-02-20", "end": "2025-02-24", "pain_scale": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["start"], "2025-02-20");

    let (status, _) = send(
        &app,
        Method::POST,
        "/period",
        Some(json!({ "start": "2025-02-22" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::POST, "/period", Some(json!({ "start": "2025-01-23", "end": "2025-01-27" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, periods) = send(&app, Method::GET, "/periods", None).await;
    let starts: Vec<&str> = periods
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["start"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["2025-01-23", "2025-02-20"]);

    let (status, cycle) = send(&app, Method::GET, "/cycle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cycle["cycle_day"], 29);
    assert_eq!(cycle["next_period"], "2025-03-20");
    assert_eq!(cycle["period_expected_in_days"], 0);

    let (_, timeline) = send(&app, Method::GET, "/cycle/timeline", None).await;
    assert_eq!(timeline.as_array().unwrap().len(), 28);
    assert_eq!(timeline[0]["phase"], "menstruation");

    let (_, upcoming) = send(&app, Method::GET, "/cycle/upcoming?count=2", None).await;
    assert_eq!(upcoming, json!(["2025-03-20", "2025-04-17"]));

    let (_, stats) = send(&app, Method::GET, "/cycle-stats", None).await;
    assert_eq!(stats["average_cycle_length"], 28);
    assert_eq!(stats["cycle_stats"][0]["cycle_length"], 28);
    assert_eq!(stats["cycle_stats"][1]["cycle_length"], Value::Null);
}

#[tokio::test]
async fn mood_logging_and_analytics() {
    let app = app();

    for (date, mood) in [("2025-03-18", "happy"), ("2025-03-19", "SAD"), ("2025-03-20", "sad")] {
        let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": date, "mood": mood }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": "2025-03-20", "mood": "angry" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": "2025-04-01", "mood": "happy" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, moods) = send(&app, Method::GET, "/moods", None).await;
    assert_eq!(moods.as_array().unwrap().len(), 3);
    assert_eq!(moods[2]["mood"], "angry");

    let (_, dist) = send(&app, Method::GET, "/mood/distribution?days=2", None).await;
    assert_eq!(dist["sad"], 1);
    assert_eq!(dist["angry"], 1);
    assert_eq!(dist["happy"], 0);

    let (_, trend) = send(&app, Method::GET, "/mood/trend", None).await;
    assert_eq!(trend["streak_mood"], "angry");
    assert_eq!(trend["streak"], 1);

    let (_, patterns) = send(&app, Method::GET, "/mood/patterns", None).await;
    assert_eq!(patterns["has_data"], false);
    assert_eq!(patterns["phases"]["luteal"]["total"], 0);

    let (status, _) = send(&app, Method::DELETE, "/mood", Some(json!({ "date": "2025-03-18" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/mood", Some(json!({ "date": "2025-03-18" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/mood", Some(json!({ "date": "18/03/2025" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn onboarding_commit_and_wipe() {
    let app = app();

    let (status, draft) = send(
        &app,
        Method::PATCH,
        "/onboarding/draft",
        Some(json!({ "last_period_start": "2025-03-01", "cycle_length": 30, "goals": ["track"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["cycle_length"], 30);

    let (status, _) = send(&app, Method::PATCH, "/onboarding/draft", Some(json!({ "cycle_length": "long" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, data) = send(&app, Method::POST, "/onboarding/commit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["cycle_length"], 30);

    let (_, state) = send(&app, Method::GET, "/onboarding", None).await;
    assert_eq!(state["completed"], true);

    let (_, achievements) = send(&app, Method::GET, "/achievements", None).await;
    assert_eq!(achievements[0]["id"], "cycle_predictor");

    let (_, insights) = send(&app, Method::GET, "/insights", None).await;
    assert_eq!(insights["cycle_status"]["cycle_day"], 20);
    assert_eq!(insights["cycle_summary"]["average_cycle_length"], 30);

    let (status, _) = send(&app, Method::DELETE, "/data", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, state) = send(&app, Method::GET, "/onboarding", None).await;
    assert_eq!(state["completed"], false);
    let (_, achievements) = send(&app, Method::GET, "/achievements", None).await;
    assert_eq!(achievements, json!([]));
}

#[tokio::test]
async fn store_keeps_serving_after_a_panicked_request() {
    let store = routes::shared(AppStore::load_with_clock(Persistence::in_memory(), fixed_today));
    let app = routes::app(store.clone());

    let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": "2025-03-19", "mood": "happy" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let holder = store.clone();
    let crashed = std::thread::spawn(move || {
        let _guard = holder.lock().unwrap();
        panic!("request handler crashed");
    })
    .join();
    assert!(crashed.is_err());
    assert!(store.is_poisoned());

    let (status, moods) = send(&app, Method::GET, "/moods", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moods[0]["mood"], "happy");
    assert!(!store.is_poisoned());

    let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": "2025-03-20", "mood": "sad" }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn extreme_windows_and_lengths_do_not_crash() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/mood", Some(json!({ "date": "2025-03-19", "mood": "anxious" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, dist) = send(&app, Method::GET, "/mood/distribution?days=4294967295", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dist["anxious"], 1);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/onboarding/draft",
        Some(json!({ "last_period_start": "2025-03-01", "cycle_length": 200000000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, "/onboarding/commit", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, insights) = send(&app, Method::GET, "/insights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(insights["cycle_summary"]["average_cycle_length"], 28);

    let (status, _) = send(&app, Method::GET, "/cycle/upcoming?count=4294967295", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
