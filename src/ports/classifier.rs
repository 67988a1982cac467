//! Classifier port: Trait for a pre-trained probabilistic classifier.
//!
//! This trait abstracts the model artifact format from the application logic.

/// Errors raised while running the classifier on a row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("feature count mismatch: got {got}, expected {expected}")]
    ShapeMismatch { got: usize, expected: usize },

    #[error("feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),

    #[error("model evaluation failed: {0}")]
    Evaluation(String),
}

/// Trait for classifier inference.
///
/// Implementations expose the two operations of the trained estimator:
/// - `predict`: the class label for a single row
/// - `predict_proba`: the per-class probability distribution for that row
pub trait Classifier: Send + Sync {
    /// Number of features each row must have.
    fn n_features(&self) -> usize;

    /// Class labels, in the order `predict_proba` reports them.
    fn classes(&self) -> &[i64];

    /// Per-class probability distribution for one row.
    ///
    /// # Errors
    /// Returns `ClassifierError` if the row has the wrong shape or the model
    /// cannot be evaluated.
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError>;

    /// Predicted class label for one row.
    ///
    /// Defaults to the class with the highest probability (first wins on ties).
    ///
    /// # Errors
    /// Returns `ClassifierError` if `predict_proba` fails or the distribution
    /// does not line up with `classes()`.
    fn predict(&self, row: &[f64]) -> Result<i64, ClassifierError> {
        let proba = self.predict_proba(row)?;
        let classes = self.classes();
        if proba.len() != classes.len() {
            return Err(ClassifierError::InvalidDistribution(format!(
                "{} probabilities for {} classes",
                proba.len(),
                classes.len()
            )));
        }

        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(classes[best])
    }
}

/// Check that a row matches the expected width and holds only finite values.
///
/// # Errors
/// Returns the first shape or value problem found.
pub fn check_row(row: &[f64], expected: usize) -> Result<(), ClassifierError> {
    if row.len() != expected {
        return Err(ClassifierError::ShapeMismatch {
            got: row.len(),
            expected,
        });
    }
    if let Some(index) = row.iter().position(|v| !v.is_finite()) {
        return Err(ClassifierError::NonFiniteFeature { index });
    }
    Ok(())
}
