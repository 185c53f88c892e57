//! Request-to-label transformation over a fixed set of trained artifacts.

use crate::error::Result;
use crate::inference::classifier::{Classifier, FeatureVector};
use crate::inference::encoder::LabelEncoder;
use crate::inference::scaler::Scaler;

/// Request defaults, matching the values the service has always advertised.
pub const DEFAULT_GENDER: &str = "Laki-laki";
pub const DEFAULT_AGE_MONTHS: i64 = 19;
pub const DEFAULT_HEIGHT_CM: f64 = 91.60;
pub const DEFAULT_WEIGHT_KG: f64 = 13.30;

/// Encoders, scaler and classifier from one training run.
///
/// Nothing here checks that the four pieces were fit together; a mismatch
/// yields wrong labels rather than errors.
pub struct Pipeline {
    classifier: Box<dyn Classifier>,
    scaler: Scaler,
    gender_encoder: LabelEncoder,
    label_encoder: LabelEncoder,
}

impl Pipeline {
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: Scaler,
        gender_encoder: LabelEncoder,
        label_encoder: LabelEncoder,
    ) -> Self {
        Self {
            classifier,
            scaler,
            gender_encoder,
            label_encoder,
        }
    }

    /// Predict the nutritional-status label for one subject.
    ///
    /// # Flow
    /// 1. Encode gender (unknown values fail with `UnknownCategory`)
    /// 2. Scale `[age, height, weight]`
    /// 3. Assemble `[gender_code, age, height, weight]`
    /// 4. Classify
    /// 5. Decode the class code into its label
    pub fn predict(&self, gender: &str, age: i64, height: f64, weight: f64) -> Result<String> {
        let gender_code = self.gender_encoder.transform(gender)?;
        let scaled = self.scaler.transform([age as f64, height, weight]);
        let features = FeatureVector::new(gender_code as f64, scaled);

        let class_code = self.classifier.predict(&features)?;
        let label = self.label_encoder.inverse_transform(class_code)?;

        tracing::trace!(?features, class_code, label, "Pipeline evaluated");
        Ok(label.to_string())
    }

    pub fn genders(&self) -> &[String] {
        self.gender_encoder.classes()
    }

    pub fn labels(&self) -> &[String] {
        self.label_encoder.classes()
    }

    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }
}
