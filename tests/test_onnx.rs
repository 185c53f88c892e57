//! Tests against a real ONNX Runtime session.
//!
//! `tests/fixtures/linear_classifier.onnx` is a MatMul + Add + ArgMax graph
//! carrying the same weights as the JSON linear model used elsewhere, with
//! input `float_input` `[1, 4]` and int64 output `label`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use stuntify::{
    build_router,
    inference::{OnnxClassifier, OnnxOptions},
    AppError, AppState, ArtifactBundle, ArtifactSource, Classifier, Config, FeatureVector,
};
use tokio::task::JoinSet;
use tower::ServiceExt;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/linear_classifier.onnx"
);

/// Default request, already scaled: age 19, height 91.6, weight 13.3.
const DEFAULT_ROW: [f64; 3] = [-11.0 / 15.0, 0.66, 1.3 / 3.0];

fn fixture_bytes() -> Vec<u8> {
    fs::read(FIXTURE).expect("Failed to read ONNX fixture")
}

fn options(pool_size: usize) -> OnnxOptions {
    OnnxOptions {
        input_name: "float_input".to_string(),
        label_output: "label".to_string(),
        pool_size,
        intra_threads: 1,
    }
}

/// ONNX classifier plus the JSON scaler and encoders.
fn write_artifacts(dir: &Path) {
    fs::copy(FIXTURE, dir.join("best_model.onnx")).unwrap();
    fs::write(
        dir.join("scaler.json"),
        json!({"kind": "standard", "mean": [30.0, 85.0, 12.0], "scale": [15.0, 10.0, 3.0]})
            .to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("Jenis Kelamin_encoder.json"),
        json!({"classes": ["Laki-laki", "Perempuan"]}).to_string(),
    )
    .unwrap();
    fs::write(
        dir.join("Stunting_encoder.json"),
        json!({"classes": ["Normal", "Severely Stunted", "Stunted", "Tinggi"]}).to_string(),
    )
    .unwrap();
}

fn test_config(dir: &Path) -> Config {
    let mut config = Config::with_artifacts_dir(dir);
    config.pool_size = Some(2);
    config
}

// ============================================================================
// Session Pool Tests
// ============================================================================

#[test]
fn test_fixture_decodes_label() {
    let classifier = OnnxClassifier::load_pool(&fixture_bytes(), &options(1)).unwrap();

    assert_eq!(classifier.kind(), "onnx");
    assert_eq!(
        classifier.predict(&FeatureVector::new(0.0, DEFAULT_ROW)).unwrap(),
        3
    );
    // 48 months, 80 cm, 10 kg.
    assert_eq!(
        classifier
            .predict(&FeatureVector::new(1.0, [1.2, -0.5, -2.0 / 3.0]))
            .unwrap(),
        1
    );
    assert_eq!(
        classifier.predict(&FeatureVector::new(0.0, [0.0; 3])).unwrap(),
        0
    );
}

#[test]
fn test_concurrent_calls_return_sessions_to_pool() {
    let classifier = Arc::new(OnnxClassifier::load_pool(&fixture_bytes(), &options(4)).unwrap());
    assert_eq!(classifier.pool_size(), 4);
    assert_eq!(classifier.idle_sessions(), 4);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let classifier = Arc::clone(&classifier);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let code = classifier
                        .predict(&FeatureVector::new(0.0, DEFAULT_ROW))
                        .unwrap();
                    assert_eq!(code, 3);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(classifier.idle_sessions(), 4);
}

#[test]
fn test_failed_run_releases_session() {
    let mut wrong_input = options(1);
    wrong_input.input_name = "features".to_string();
    let classifier = OnnxClassifier::load_pool(&fixture_bytes(), &wrong_input).unwrap();

    // With a single session, a leak would turn the second call into a pool error.
    for _ in 0..3 {
        let result = classifier.predict(&FeatureVector::new(0.0, DEFAULT_ROW));
        assert!(matches!(result, Err(AppError::Prediction(_))));
        assert_eq!(classifier.idle_sessions(), 1);
    }
}

#[test]
fn test_missing_label_output_is_prediction_error() {
    let mut wrong_output = options(1);
    wrong_output.label_output = "output_label".to_string();
    let classifier = OnnxClassifier::load_pool(&fixture_bytes(), &wrong_output).unwrap();

    match classifier.predict(&FeatureVector::new(0.0, DEFAULT_ROW)) {
        Err(AppError::Prediction(msg)) => assert!(msg.contains("output_label")),
        other => panic!("expected prediction error, got {other:?}"),
    }
    assert_eq!(classifier.idle_sessions(), 1);
}

// ============================================================================
// Bundle and Router Tests
// ============================================================================

#[test]
fn test_bundle_loads_onnx_classifier() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());

    let bundle = ArtifactBundle::load(&ArtifactSource::from_config(&test_config(dir.path())))
        .unwrap();
    bundle.warmup();

    assert_eq!(bundle.pipeline().classifier_kind(), "onnx");
    assert_eq!(bundle.predict("Laki-laki", 19, 91.6, 13.3).unwrap(), "Tinggi");
    assert_eq!(
        bundle.predict("Perempuan", 48, 80.0, 10.0).unwrap(),
        "Severely Stunted"
    );
    assert!(matches!(
        bundle.predict("Other", 19, 91.6, 13.3),
        Err(AppError::UnknownCategory(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_session_pool() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path());
    let app = build_router(Arc::new(AppState::new(test_config(dir.path()))));

    let mut requests = JoinSet::new();
    for i in 0..16 {
        let app = app.clone();
        let body = if i % 2 == 0 {
            json!({})
        } else {
            json!({"jenis_kelamin": "Perempuan", "umur": 48, "tinggi": 80.0, "berat": 10.0})
        };
        requests.spawn(async move {
            let req = Request::builder()
                .method("POST")
                .uri("/predict-stunting")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let response = app.oneshot(req).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            (i, status, body)
        });
    }

    while let Some(joined) = requests.join_next().await {
        let (i, status, body) = joined.unwrap();
        assert_eq!(status, StatusCode::OK);
        let expected = if i % 2 == 0 { "Tinggi" } else { "Severely Stunted" };
        assert_eq!(body["prediction"], expected);
    }
}
