pub mod classifier;
pub mod encoder;
pub mod onnx;
pub mod pipeline;
pub mod scaler;

pub use classifier::{Classifier, FeatureVector, LinearClassifier, FEATURE_COUNT};
pub use encoder::LabelEncoder;
pub use onnx::{OnnxClassifier, OnnxOptions};
pub use pipeline::{
    Pipeline, DEFAULT_AGE_MONTHS, DEFAULT_GENDER, DEFAULT_HEIGHT_CM, DEFAULT_WEIGHT_KG,
};
pub use scaler::Scaler;
