// Integration tests for the prediction service
//
// Tests cover:
// - Fallback policy for empty and small histories
// - Regression fit, clamping and degenerate designs
// - Malformed stored entries
// - The full HTTP surface, observability endpoints included

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use glucoscore::api::{app_state::AppState, create_router};
use glucoscore::config::AppConfig;
use glucoscore::models::{FeatureQuery, NewObservation, Observation};
use glucoscore::observability::{AppMetrics, ObservabilityState, create_observability_router};
use glucoscore::predictor::{
    MAX_SCORE, MIN_SCORE, NOTE_CLAMPED, NOTE_INSUFFICIENT_DATA, NOTE_NO_DATA,
    NOTE_REGRESSION_FAILED, Predictor, predict,
};
use glucoscore::services::create_prediction_service;
use glucoscore::storage::{EntryStore, MemoryEntryStore};

fn observation(id: u64, avg: f64, sd: f64, difficulty: f64, score: f64) -> Observation {
    Observation::new(id, Utc::now(), NewObservation::new(avg, sd, difficulty, score))
}

fn varied_history() -> Vec<Observation> {
    vec![
        observation(1, 110.0, 20.0, 4.0, 81.0),
        observation(2, 150.0, 35.0, 7.0, 64.0),
        observation(3, 95.0, 12.0, 3.0, 92.0),
        observation(4, 180.0, 50.0, 8.0, 55.0),
        observation(5, 130.0, 28.0, 6.0, 73.0),
        observation(6, 105.0, 18.0, 9.0, 70.0),
    ]
}

#[test]
fn test_empty_history_predicts_zero() {
    let result = predict(&[], &FeatureQuery::new(120.0, 25.0, 5.0)).unwrap();
    assert_eq!(result.predicted_score, 0.0);
    assert!(result.has_note(NOTE_NO_DATA));
}

#[rstest]
#[case(1)]
#[case(2)]
fn test_small_history_predicts_mean(#[case] n: usize) {
    let history: Vec<_> = varied_history().into_iter().take(n).collect();
    let mean = history.iter().filter_map(|o| o.score).sum::<f64>() / n as f64;

    let result = predict(&history, &FeatureQuery::new(300.0, 90.0, 10.0)).unwrap();
    assert!((result.predicted_score - mean).abs() < 1e-9);
    assert!(result.has_note(NOTE_INSUFFICIENT_DATA));
}

#[test]
fn test_regression_on_noisy_history() {
    let result = predict(&varied_history(), &FeatureQuery::new(120.0, 22.0, 5.0)).unwrap();

    assert!(result.model.fitted);
    assert!((MIN_SCORE..=MAX_SCORE).contains(&result.predicted_score));
    assert!(result.has_note("Model fit using 6 historical entries."));
    let r2 = result.model.r2.unwrap();
    assert!((0.0..=1.0).contains(&r2));
}

#[test]
fn test_collinear_features_fall_back() {
    // glucose_sd is exactly a fifth of avg_glucose
    let history = vec![
        observation(1, 100.0, 20.0, 3.0, 80.0),
        observation(2, 150.0, 30.0, 5.0, 70.0),
        observation(3, 200.0, 40.0, 4.0, 60.0),
        observation(4, 120.0, 24.0, 8.0, 90.0),
    ];

    let result = predict(&history, &FeatureQuery::new(130.0, 26.0, 5.0)).unwrap();
    assert!((result.predicted_score - 75.0).abs() < 1e-9);
    assert!(result.has_note(NOTE_REGRESSION_FAILED));
    assert!(!result.model.fitted);
}

#[test]
fn test_clamping_through_public_api() {
    // score = 10 + 0.2·avg + 3·difficulty
    let rows = [
        (100.0, 10.0, 2.0),
        (200.0, 30.0, 1.0),
        (150.0, 20.0, 4.0),
        (250.0, 50.0, 3.0),
    ];
    let history: Vec<_> = rows
        .into_iter()
        .zip(1..)
        .map(|((avg, sd, d), id)| observation(id, avg, sd, d, 10.0 + 0.2 * avg + 3.0 * d))
        .collect();

    let high = predict(&history, &FeatureQuery::new(2000.0, 0.0, 10.0)).unwrap();
    assert_eq!(high.predicted_score, MAX_SCORE);
    assert!(high.has_note(NOTE_CLAMPED));

    let low = predict(&history, &FeatureQuery::new(1.0, 0.0, -30.0)).unwrap();
    assert_eq!(low.predicted_score, MIN_SCORE);
    assert!(low.has_note(NOTE_CLAMPED));
}

#[test]
fn test_predictor_is_shareable_across_threads() {
    let predictor = Arc::new(Predictor::new(&AppConfig::testing().predictor));
    let history = Arc::new(varied_history());
    let query = FeatureQuery::new(125.0, 22.0, 5.0);
    let expected = predictor.predict(&history, &query).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let predictor = predictor.clone();
            let history = history.clone();
            std::thread::spawn(move || predictor.predict(&history, &query).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

fn full_app(store: Arc<dyn EntryStore>) -> Router {
    let config = AppConfig::testing();
    let metrics = Arc::new(AppMetrics::default());
    let service = create_prediction_service(store.clone(), Predictor::new(&config.predictor));
    let observability = Arc::new(ObservabilityState::new(
        "test".to_string(),
        metrics.clone(),
        store,
    ));

    create_observability_router(observability)
        .merge(create_router(AppState::new(service, metrics), &config.server))
}

async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_malformed_stored_entry_returns_server_error() {
    let mut broken = observation(1, 120.0, 25.0, 6.0, 80.0);
    broken.score = None;
    let app = full_app(Arc::new(MemoryEntryStore::with_entries(vec![broken])));

    let query = json!({"avg_glucose": 110, "glucose_sd": 20, "difficulty": 5});
    let (status, body) = call(&app, "POST", "/api/predict", query).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["code"], "MALFORMED_OBSERVATION");

    let (_, metrics) = call(&app, "GET", "/metrics", Value::Null).await;
    assert!(metrics.contains("errors_total 1"));
}

#[tokio::test]
async fn test_full_flow_with_observability() {
    let app = full_app(Arc::new(MemoryEntryStore::new()));

    let (status, body) = call(&app, "GET", "/health/live", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, _) = call(&app, "GET", "/health/ready", Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    for entry in varied_history() {
        let payload = json!({
            "avg_glucose": entry.avg_glucose,
            "glucose_sd": entry.glucose_sd,
            "difficulty": entry.difficulty,
            "score": entry.score,
        });
        let (status, _) = call(&app, "POST", "/api/entries", payload).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(
        &app,
        "POST",
        "/api/predict",
        json!({"avg_glucose": 120, "glucose_sd": 22, "difficulty": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["model"]["n_training_rows"], 6);
    assert_eq!(body["model"]["fitted"], true);

    let (_, metrics) = call(&app, "GET", "/metrics", Value::Null).await;
    assert!(metrics.contains("entries_total 6"));
    assert!(metrics.contains("predictions_total 1"));
    assert!(metrics.contains("predictions_degraded_total 0"));
}
