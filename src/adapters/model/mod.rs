//! JSON model adapter: Implementation of `Classifier` for exported estimators.
//!
//! The training environment exports the fitted estimator as JSON instead of a
//! language-specific pickle. Supported estimators:
//! - `logistic_regression`: binary, `P(classes[1]) = sigmoid(w·x + b)`
//! - `decision_tree`: a single tree in sklearn `tree_` array layout
//! - `random_forest`: several such trees, probabilities averaged
//!
//! # Tree layout
//!
//! Node `i` is a leaf when `children_left[i] == -1`. Otherwise the row goes
//! left when `x[feature[i]] <= threshold[i]`, right otherwise. `value[i]` holds
//! per-class weights (counts or fractions); leaf probabilities are the weights
//! normalized to sum to one.
//!
//! All structural checks happen at load time, so evaluation never indexes out
//! of bounds and always terminates (children must point forward).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adapters::artifacts::ArtifactError;
use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{check_row, Classifier, ClassifierError};

/// Model artifact format version understood by this adapter.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Top-level model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub format_version: u32,
    /// Training column order. Empty means "not recorded".
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub classes: Vec<i64>,
    pub estimator: ExportedEstimator,
}

/// Fitted estimator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportedEstimator {
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    DecisionTree { tree: ExportedTree },
    RandomForest { trees: Vec<ExportedTree> },
}

/// One decision tree in sklearn array layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

const LEAF: i64 = -1;

impl ExportedTree {
    fn validate(&self, tree_idx: usize, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err(format!("tree {tree_idx} has no nodes"));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree {tree_idx}: node array lengths differ"));
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF {
                if right != LEAF {
                    return Err(format!("tree {tree_idx} node {i}: half-leaf node"));
                }
                let weights = &self.value[i];
                if weights.len() != n_classes {
                    return Err(format!(
                        "tree {tree_idx} node {i}: {} leaf weights for {n_classes} classes",
                        weights.len()
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(format!("tree {tree_idx} node {i}: negative or non-finite weight"));
                }
                if weights.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("tree {tree_idx} node {i}: leaf weights sum to zero"));
                }
                continue;
            }

            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!(
                        "tree {tree_idx} node {i}: child {child} must point forward within {n} nodes"
                    ));
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!(
                    "tree {tree_idx} node {i}: split feature {feature} out of range"
                ));
            }
            if self.threshold[i].is_nan() {
                return Err(format!("tree {tree_idx} node {i}: NaN threshold"));
            }
        }
        Ok(())
    }

    /// Leaf weights for a row; callers validated the tree and the row.
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        while self.children_left[idx] != LEAF {
            let feature = self.feature[idx] as usize;
            idx = if row[feature] <= self.threshold[idx] {
                self.children_left[idx] as usize
            } else {
                self.children_right[idx] as usize
            };
        }
        &self.value[idx]
    }

    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let weights = self.leaf(row);
        let total: f64 = weights.iter().sum();
        weights.iter().map(|w| w / total).collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Classifier backed by an exported JSON model.
#[derive(Debug, Clone)]
pub struct JsonClassifier {
    model: ExportedModel,
}

impl JsonClassifier {
    /// Load and validate a model artifact.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the file is unreadable, malformed, or fails
    /// structural validation.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: ExportedModel =
            serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let classifier = Self::from_model(model)?;

        tracing::info!(
            "Loaded model from {:?} (estimator={}, n_classes={})",
            path,
            classifier.estimator_kind(),
            classifier.model.classes.len()
        );
        Ok(classifier)
    }

    /// Validate an in-memory model.
    ///
    /// # Errors
    /// Returns `ArtifactError::InvalidModel` describing the first problem found.
    pub fn from_model(model: ExportedModel) -> Result<Self, ArtifactError> {
        Self::validate(&model).map_err(ArtifactError::InvalidModel)?;
        Ok(Self { model })
    }

    fn validate(model: &ExportedModel) -> Result<(), String> {
        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {MODEL_FORMAT_VERSION})",
                model.format_version
            ));
        }

        if !model.feature_names.is_empty() && model.feature_names != FEATURE_NAMES {
            return Err(format!(
                "feature order mismatch: model was trained on {:?}",
                model.feature_names
            ));
        }

        let n_classes = model.classes.len();
        if n_classes < 2 {
            return Err(format!("expected at least 2 classes, got {n_classes}"));
        }
        if !model.classes.contains(&1) {
            return Err("classes must include the positive label 1".into());
        }
        for (i, c) in model.classes.iter().enumerate() {
            if model.classes[..i].contains(c) {
                return Err(format!("duplicate class label {c}"));
            }
        }

        match &model.estimator {
            ExportedEstimator::LogisticRegression {
                coefficients,
                intercept,
            } => {
                if n_classes != 2 {
                    return Err("logistic_regression supports exactly 2 classes".into());
                }
                if coefficients.len() != FEATURE_COUNT {
                    return Err(format!(
                        "{} coefficients for {FEATURE_COUNT} features",
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("non-finite logistic_regression parameter".into());
                }
            }
            ExportedEstimator::DecisionTree { tree } => {
                tree.validate(0, FEATURE_COUNT, n_classes)?;
            }
            ExportedEstimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random_forest has no trees".into());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(i, FEATURE_COUNT, n_classes)?;
                }
            }
        }
        Ok(())
    }

    /// Short name of the wrapped estimator.
    #[must_use]
    pub fn estimator_kind(&self) -> &'static str {
        match self.model.estimator {
            ExportedEstimator::LogisticRegression { .. } => "logistic_regression",
            ExportedEstimator::DecisionTree { .. } => "decision_tree",
            ExportedEstimator::RandomForest { .. } => "random_forest",
        }
    }
}

impl Classifier for JsonClassifier {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn classes(&self) -> &[i64] {
        &self.model.classes
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        check_row(row, FEATURE_COUNT)?;

        let proba = match &self.model.estimator {
            ExportedEstimator::LogisticRegression {
                coefficients,
                intercept,
            } => {
                let z: f64 = coefficients
                    .iter()
                    .zip(row)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + intercept;
                let p1 = sigmoid(z);
                if !p1.is_finite() {
                    return Err(ClassifierError::Evaluation("logit overflow".into()));
                }
                // The logit scores the second listed class.
                vec![1.0 - p1, p1]
            }
            ExportedEstimator::DecisionTree { tree } => tree.predict_proba(row),
            ExportedEstimator::RandomForest { trees } => {
                let mut sum = vec![0.0; self.model.classes.len()];
                for tree in trees {
                    for (acc, p) in sum.iter_mut().zip(tree.predict_proba(row)) {
                        *acc += p;
                    }
                }
                let n = trees.len() as f64;
                sum.into_iter().map(|p| p / n).collect()
            }
        };

        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names() -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
    }

    /// Root splits on `result` (index 1) at 6.5; right child splits on
    /// `austim` (index 15) at 0.5.
    fn stump_tree() -> ExportedTree {
        ExportedTree {
            children_left: vec![1, -1, 3, -1, -1],
            children_right: vec![2, -1, 4, -1, -1],
            feature: vec![1, -2, 15, -2, -2],
            threshold: vec![6.5, -2.0, 0.5, -2.0, -2.0],
            value: vec![
                vec![50.0, 50.0],
                vec![45.0, 5.0],
                vec![5.0, 45.0],
                vec![4.0, 16.0],
                vec![1.0, 29.0],
            ],
        }
    }

    fn tree_model(estimator: ExportedEstimator) -> ExportedModel {
        ExportedModel {
            format_version: 1,
            feature_names: names(),
            classes: vec![0, 1],
            estimator,
        }
    }

    fn row(result: f64, austim: f64) -> Vec<f64> {
        let mut r = vec![0.0; FEATURE_COUNT];
        r[0] = 30.0;
        r[1] = result;
        r[15] = austim;
        r
    }

    #[test]
    fn test_tree_traversal_and_threshold_goes_left() {
        let clf = JsonClassifier::from_model(tree_model(ExportedEstimator::DecisionTree {
            tree: stump_tree(),
        }))
        .expect("valid model");

        let p = clf.predict_proba(&row(6.5, 0.0)).unwrap();
        assert!((p[0] - 0.9).abs() < 1e-12);
        assert_eq!(clf.predict(&row(6.5, 0.0)), Ok(0));

        let p = clf.predict_proba(&row(9.0, 0.0)).unwrap();
        assert!((p[1] - 0.8).abs() < 1e-12);

        let p = clf.predict_proba(&row(9.0, 1.0)).unwrap();
        assert!((p[1] - 29.0 / 30.0).abs() < 1e-12);
        assert_eq!(clf.predict(&row(9.0, 1.0)), Ok(1));
    }

    #[test]
    fn test_forest_averages_tree_probabilities() {
        let constant = ExportedTree {
            children_left: vec![-1],
            children_right: vec![-1],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![vec![0.5, 0.5]],
        };
        let clf = JsonClassifier::from_model(tree_model(ExportedEstimator::RandomForest {
            trees: vec![stump_tree(), constant],
        }))
        .expect("valid model");

        let p = clf.predict_proba(&row(2.0, 0.0)).unwrap();
        assert!((p[0] - (0.9 + 0.5) / 2.0).abs() < 1e-12);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_regression_probabilities() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[1] = 1.0;
        let clf = JsonClassifier::from_model(tree_model(ExportedEstimator::LogisticRegression {
            coefficients,
            intercept: -5.0,
        }))
        .expect("valid model");

        let p = clf.predict_proba(&row(5.0, 0.0)).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);

        let p = clf.predict_proba(&row(10.0, 0.0)).unwrap();
        assert!((p[1] - sigmoid(5.0)).abs() < 1e-12);
        assert_eq!(clf.predict(&row(10.0, 0.0)), Ok(1));
    }

    #[test]
    fn test_logistic_regression_scores_second_listed_class() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[1] = 1.0;
        let mut model = tree_model(ExportedEstimator::LogisticRegression {
            coefficients,
            intercept: 0.0,
        });
        model.classes = vec![1, 2];
        let clf = JsonClassifier::from_model(model).expect("valid model");

        let p = clf.predict_proba(&row(5.0, 0.0)).unwrap();
        assert!((p[1] - sigmoid(5.0)).abs() < 1e-12);
        assert!((p[0] - (1.0 - sigmoid(5.0))).abs() < 1e-12);
        assert_eq!(clf.predict(&row(5.0, 0.0)), Ok(2));
        assert_eq!(clf.predict(&row(-5.0, 0.0)), Ok(1));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let clf = JsonClassifier::from_model(tree_model(ExportedEstimator::DecisionTree {
            tree: stump_tree(),
        }))
        .unwrap();
        let err = clf.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ClassifierError::ShapeMismatch {
                got: 2,
                expected: FEATURE_COUNT
            }
        );
    }

    #[test]
    fn test_rejects_feature_order_mismatch() {
        let mut model = tree_model(ExportedEstimator::DecisionTree { tree: stump_tree() });
        model.feature_names.swap(0, 1);
        let err = JsonClassifier::from_model(model).unwrap_err();
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn test_rejects_backward_child_pointer() {
        let mut tree = stump_tree();
        tree.children_right[2] = 0;
        let err = JsonClassifier::from_model(tree_model(ExportedEstimator::DecisionTree { tree }))
            .unwrap_err();
        assert!(err.to_string().contains("point forward"));
    }

    #[test]
    fn test_rejects_out_of_range_split_feature() {
        let mut tree = stump_tree();
        tree.feature[0] = FEATURE_COUNT as i64;
        let err = JsonClassifier::from_model(tree_model(ExportedEstimator::DecisionTree { tree }))
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_rejects_missing_positive_class() {
        let mut model = tree_model(ExportedEstimator::DecisionTree { tree: stump_tree() });
        model.classes = vec![0, 2];
        assert!(JsonClassifier::from_model(model).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("best_model.json");
        let model = tree_model(ExportedEstimator::DecisionTree { tree: stump_tree() });
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();

        let clf = JsonClassifier::load(&path).expect("load model");
        assert_eq!(clf.estimator_kind(), "decision_tree");
        assert_eq!(clf.classes(), &[0, 1]);
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("best_model.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonClassifier::load(&path).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp = tempdir().expect("tempdir");
        let err = JsonClassifier::load(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
