//! Inference service: turns a screening submission into a prediction.
//!
//! This service coordinates:
//! - Numeric parsing of the free-text fields
//! - Categorical resolution against the fitted encoders
//! - Feature vector assembly in training order
//! - The classifier's predict and predict-probability calls

use std::sync::Arc;

use crate::domain::{
    max_probability, CategoricalField, EncoderSet, Encoding, Prediction, ScreeningFeatures,
    ScreeningRequest,
};
use crate::ports::{Classifier, ClassifierError};
use crate::AutiscreenError;

/// Read-only inference context, built once at startup.
///
/// Both artifacts sit behind `Arc` so the service can be cloned into any
/// front-end without copying them; nothing here is mutated after construction.
pub struct InferenceService<C>
where
    C: Classifier,
{
    classifier: Arc<C>,
    encoders: Arc<EncoderSet>,
}

impl<C: Classifier> Clone for InferenceService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: Arc::clone(&self.classifier),
            encoders: Arc::clone(&self.encoders),
        }
    }
}

impl<C> InferenceService<C>
where
    C: Classifier,
{
    /// Create a new inference service.
    pub fn new(classifier: Arc<C>, encoders: Arc<EncoderSet>) -> Self {
        Self {
            classifier,
            encoders,
        }
    }

    #[must_use]
    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    /// Parse and encode a submission without running the classifier.
    ///
    /// # Errors
    /// Returns `AutiscreenError::InvalidInput` if age or result is not a finite number.
    pub fn build_features(
        &self,
        request: &ScreeningRequest,
    ) -> Result<ScreeningFeatures, AutiscreenError> {
        let age = parse_number("Age", &request.age)?;
        let result = parse_number("Result Score", &request.result)?;

        let encodings: [Encoding; 7] = CategoricalField::ALL.map(|field| {
            let encoding = self.encoders.resolve(field, request.category(field));
            if let Encoding::Fallback { code, reason } = encoding {
                tracing::warn!(
                    "Unseen {} category resolved via fallback ({:?}, code {})",
                    field,
                    reason,
                    code
                );
            }
            encoding
        });

        Ok(ScreeningFeatures {
            age,
            result,
            answers: request.answers,
            encodings,
        })
    }

    /// Run the full pipeline for one submission.
    ///
    /// Every failure is returned as an error value; the service holds no
    /// per-submission state, so the next call is unaffected.
    ///
    /// # Errors
    /// Returns `InvalidInput` for malformed numbers and `Classifier` if the
    /// model rejects the row or produces an invalid distribution.
    pub fn predict(&self, request: &ScreeningRequest) -> Result<Prediction, AutiscreenError> {
        let features = self.build_features(request)?;
        let vector = features.to_vector();
        if self.classifier.n_features() != vector.len() {
            return Err(ClassifierError::ShapeMismatch {
                got: vector.len(),
                expected: self.classifier.n_features(),
            }
            .into());
        }
        tracing::debug!("Assembled feature vector {:?}", vector.as_slice());

        let class = self.classifier.predict(vector.as_slice())?;
        let probabilities = self.classifier.predict_proba(vector.as_slice())?;

        if !self.classifier.classes().contains(&class) {
            return Err(ClassifierError::InvalidDistribution(format!(
                "predicted class {class} is not among the model classes"
            ))
            .into());
        }
        if max_probability(&probabilities).is_none() {
            return Err(ClassifierError::InvalidDistribution(
                "probabilities must be finite values in [0, 1]".into(),
            )
            .into());
        }

        let prediction = Prediction::new(class, probabilities, features.fallbacks()).ok_or_else(
            || ClassifierError::InvalidDistribution("empty probability distribution".into()),
        )?;

        tracing::info!(
            "Prediction complete: label={}, confidence={:.2}, fallbacks={}",
            prediction.label,
            prediction.confidence,
            prediction.fallbacks.len()
        );

        Ok(prediction)
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, AutiscreenError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AutiscreenError::InvalidInput(format!("{field}: value is required")));
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AutiscreenError::InvalidInput(format!(
            "{field}: not a valid number"
        ))),
    }
}
