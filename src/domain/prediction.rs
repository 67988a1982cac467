//! Prediction result types.
//!
//! Represents the classifier output for one screening submission.

use serde::{Deserialize, Serialize};

use super::encoder::{CategoricalField, Encoding};

/// Binary screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    /// Predicted class 1
    Likely,
    /// Any other predicted class
    Unlikely,
}

impl PredictionLabel {
    /// Map a predicted class label to the screening outcome.
    #[must_use]
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            Self::Likely
        } else {
            Self::Unlikely
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Likely => "Autism Likely",
            Self::Unlikely => "Autism Unlikely",
        }
    }

    /// RGB color for TUI display.
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Likely => (244, 63, 94),    // Rose (#F43F5E)
            Self::Unlikely => (16, 185, 129), // Emerald (#10B981)
        }
    }
}

impl std::fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Likely => write!(f, "LIKELY"),
            Self::Unlikely => write!(f, "UNLIKELY"),
        }
    }
}

/// Outcome of one inference call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: PredictionLabel,

    /// Class label returned by the classifier.
    pub class: i64,

    /// Maximum class probability, in [0, 1].
    pub confidence: f64,

    /// Per-class probability distribution, in classifier class order.
    pub probabilities: Vec<f64>,

    /// Categorical fields that were resolved through a fallback bucket.
    pub fallbacks: Vec<(CategoricalField, Encoding)>,

    pub evaluated_at: chrono::DateTime<chrono::Utc>,
}

impl Prediction {
    /// Build a prediction from the classifier outputs.
    ///
    /// Returns `None` if the distribution is empty or any entry is outside [0, 1].
    #[must_use]
    pub fn new(
        class: i64,
        probabilities: Vec<f64>,
        fallbacks: Vec<(CategoricalField, Encoding)>,
    ) -> Option<Self> {
        let confidence = max_probability(&probabilities)?;
        Some(Self {
            label: PredictionLabel::from_class(class),
            class,
            confidence,
            probabilities,
            fallbacks,
            evaluated_at: chrono::Utc::now(),
        })
    }
}

/// Largest entry of a probability distribution.
#[must_use]
pub fn max_probability(probabilities: &[f64]) -> Option<f64> {
    if probabilities.is_empty()
        || probabilities
            .iter()
            .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
    {
        return None;
    }
    probabilities.iter().copied().reduce(f64::max)
}
