//! Screening inputs and the classifier feature vector.
//!
//! Feature order is fixed by the training pipeline:
//! age, result, A1..A10, then the seven categorical codes.

use serde::{Deserialize, Serialize};

use super::encoder::{CategoricalField, Encoding};

/// Number of questionnaire items (A1..A10).
pub const QUESTION_COUNT: usize = 10;

/// Length of the feature vector the classifier was trained on.
pub const FEATURE_COUNT: usize = 2 + QUESTION_COUNT + 7;

/// Feature names in classifier order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "result",
    "A1_Score",
    "A2_Score",
    "A3_Score",
    "A4_Score",
    "A5_Score",
    "A6_Score",
    "A7_Score",
    "A8_Score",
    "A9_Score",
    "A10_Score",
    "gender",
    "ethnicity",
    "jaundice",
    "austim",
    "contry_of_res",
    "used_app_before",
    "relation",
];

/// Answer to one questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Answer {
    #[default]
    No,
    Yes,
}

impl Answer {
    /// Display label shown in the form.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::No => "No (0)",
            Self::Yes => "Yes (1)",
        }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Yes => 1.0,
        }
    }

    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Yes => Self::No,
        }
    }
}

/// Raw submission as typed by the user.
///
/// Numbers are kept as text so that parsing happens at the inference boundary
/// and malformed input becomes a reportable error rather than a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub age: String,
    pub result: String,
    pub answers: [Answer; QUESTION_COUNT],
    /// Raw categorical values, indexed by `CategoricalField::index`.
    pub categories: [String; 7],
}

impl ScreeningRequest {
    /// Raw value entered for a categorical field.
    #[must_use]
    pub fn category(&self, field: CategoricalField) -> &str {
        &self.categories[field.index()]
    }
}

/// Parsed and encoded inputs, ready to be flattened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningFeatures {
    pub age: f64,
    pub result: f64,
    pub answers: [Answer; QUESTION_COUNT],
    /// Resolved codes, indexed by `CategoricalField::index`.
    pub encodings: [Encoding; 7],
}

impl ScreeningFeatures {
    /// Flatten into classifier order.
    #[must_use]
    pub fn to_vector(&self) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        values[0] = self.age;
        values[1] = self.result;
        for (i, answer) in self.answers.iter().enumerate() {
            values[2 + i] = answer.value();
        }
        for (i, encoding) in self.encodings.iter().enumerate() {
            values[2 + QUESTION_COUNT + i] = f64::from(encoding.code());
        }
        FeatureVector(values)
    }

    /// Categorical fields whose values were not recognised by their encoder.
    #[must_use]
    pub fn fallbacks(&self) -> Vec<(CategoricalField, Encoding)> {
        CategoricalField::ALL
            .into_iter()
            .map(|f| (f, self.encodings[f.index()]))
            .filter(|(_, e)| e.is_fallback())
            .collect()
    }
}

/// Single classifier input row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}
