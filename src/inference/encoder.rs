use crate::error::{AppError, Result};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct LabelEncoderFile {
    classes: Vec<String>,
}

/// Bijective mapping between a fixed string vocabulary and integer codes.
///
/// The code of a value is its position in `classes`, which mirrors how the
/// training side assigns codes. Used both for the gender feature and for the
/// target label.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(AppError::ArtifactLoad(
                "Encoder vocabulary is empty".to_string(),
            ));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (idx, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), idx as i64).is_some() {
                return Err(AppError::ArtifactLoad(format!(
                    "Encoder vocabulary contains duplicate class '{}'",
                    class
                )));
            }
        }

        Ok(Self { classes, codes })
    }

    /// Parse an encoder artifact of the form `{"classes": [...]}`.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let file: LabelEncoderFile = serde_json::from_slice(bytes)
            .map_err(|e| AppError::ArtifactLoad(format!("Malformed encoder: {}", e)))?;
        Self::new(file.classes)
    }

    /// Encode a category into its numeric code.
    pub fn transform(&self, value: &str) -> Result<i64> {
        self.codes.get(value).copied().ok_or_else(|| {
            AppError::UnknownCategory(format!(
                "'{}' is not one of [{}]",
                value,
                self.classes.join(", ")
            ))
        })
    }

    /// Decode a numeric code back into its category.
    pub fn inverse_transform(&self, code: i64) -> Result<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::Prediction(format!(
                    "Class code {} is outside the encoder vocabulary of {} classes",
                    code,
                    self.classes.len()
                ))
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
