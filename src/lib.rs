//! # Autiscreen
//!
//! Questionnaire-based autism screening backed by a pre-trained classifier.
//! For educational and research use only; a prediction is not a diagnosis.
//!
//! This crate provides:
//! - Categorical encoding with a graceful fallback for unseen values
//! - Fixed-order feature vector assembly
//! - Inference against a JSON-exported classifier
//! - Terminal UI for entering a screening and reading the result
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (label encoders, screening inputs, predictions)
//! - `ports`: Trait definitions for external operations (the classifier)
//! - `adapters`: Concrete implementations (JSON model, encoders, manifest, log sanitizer)
//! - `application`: The inference use case
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{Encoding, FeatureVector, Prediction, PredictionLabel, ScreeningRequest};

/// Result type for Autiscreen operations
pub type Result<T> = std::result::Result<T, AutiscreenError>;

/// Main error type for Autiscreen
#[derive(Debug, thiserror::Error)]
pub enum AutiscreenError {
    #[error("Artifact load failed: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Classifier failed: {0}")]
    Classifier(#[from] ports::ClassifierError),
}
