//! Tests for the inference pipeline assembled in memory.
//!
//! The ONNX-backed tests need an exported artifact bundle and are ignored by
//! default. Run with: ARTIFACTS_DIR=/abs/path/to/models cargo test --test test_pipeline -- --ignored

use std::sync::Arc;
use stuntify::{
    ArtifactBundle, ArtifactSource, Classifier, Config, FeatureVector, LabelEncoder,
    LinearClassifier, Pipeline, Scaler,
};

const SCALER_MEAN: [f64; 3] = [30.0, 85.0, 12.0];
const SCALER_SCALE: [f64; 3] = [15.0, 10.0, 3.0];

fn classifier() -> LinearClassifier {
    LinearClassifier::new(
        vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 2.0, -4.0, 0.0],
            vec![0.0, 1.0, -2.0, 0.0],
            vec![0.0, -2.0, 4.0, 0.0],
        ],
        vec![0.0, -1.0, -0.2, -2.0],
        vec![0, 1, 2, 3],
    )
    .unwrap()
}

fn scaler() -> Scaler {
    Scaler::Standard {
        mean: SCALER_MEAN,
        scale: SCALER_SCALE,
    }
}

fn label_encoder() -> LabelEncoder {
    LabelEncoder::new(
        ["Normal", "Severely Stunted", "Stunted", "Tinggi"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
    .unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::new(
        Box::new(classifier()),
        scaler(),
        LabelEncoder::new(vec!["Laki-laki".into(), "Perempuan".into()]).unwrap(),
        label_encoder(),
    )
}

#[test]
fn test_feature_order_changes_prediction() {
    let pipeline = pipeline();
    let (age, height, weight) = (19, 91.6, 13.3);

    let label = pipeline.predict("Laki-laki", age, height, weight).unwrap();

    // Same values, age and height columns swapped.
    let [a, h, w] = scaler().transform([age as f64, height, weight]);
    let swapped = FeatureVector::new(0.0, [h, a, w]);
    let swapped_code = classifier().predict(&swapped).unwrap();
    let encoder = label_encoder();
    let swapped_label = encoder.inverse_transform(swapped_code).unwrap();

    assert_eq!(label, "Tinggi");
    assert_eq!(swapped_label, "Severely Stunted");
    assert_ne!(label, swapped_label);
}

#[test]
fn test_pipeline_matches_manual_steps() {
    let pipeline = pipeline();
    for (gender, code) in [("Laki-laki", 0.0), ("Perempuan", 1.0)] {
        for (age, height, weight) in [(3, 55.0, 5.0), (24, 86.0, 12.0), (59, 120.0, 22.0)] {
            let scaled = scaler().transform([age as f64, height, weight]);
            let expected_code = classifier()
                .predict(&FeatureVector::new(code, scaled))
                .unwrap();
            let encoder = label_encoder();
            let expected = encoder.inverse_transform(expected_code).unwrap();

            assert_eq!(
                pipeline.predict(gender, age, height, weight).unwrap(),
                expected
            );
        }
    }
}

#[test]
fn test_bundle_is_shareable_across_threads() {
    let bundle = Arc::new(ArtifactBundle::from_pipeline(pipeline(), "in-memory"));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let bundle = Arc::clone(&bundle);
            std::thread::spawn(move || bundle.predict("Perempuan", 12 + i * 12, 80.0, 10.0).unwrap())
        })
        .collect();

    for handle in handles {
        let label = handle.join().unwrap();
        assert!(bundle.pipeline().labels().contains(&label));
    }
    assert_eq!(bundle.fingerprint(), "in-memory");
}

#[test]
#[ignore = "Requires exported artifacts - set ARTIFACTS_DIR and run with --ignored"]
fn test_onnx_bundle_predicts_known_labels() {
    let config = Config::from_env().expect("Failed to load config");
    let bundle =
        ArtifactBundle::load(&ArtifactSource::from_config(&config)).expect("Failed to load artifacts");

    assert_eq!(bundle.pipeline().classifier_kind(), "onnx");
    for gender in bundle.pipeline().genders() {
        let first = bundle.predict(gender, 19, 91.6, 13.3).unwrap();
        let second = bundle.predict(gender, 19, 91.6, 13.3).unwrap();
        assert_eq!(first, second);
        assert!(bundle.pipeline().labels().contains(&first));
    }
}
