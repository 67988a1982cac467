//! Domain layer: Core screening types and the encoding policy.
//!
//! This module contains plain Rust types with no I/O.

mod encoder;
mod prediction;
mod screening;

pub use encoder::{
    CategoricalField, EncoderError, EncoderSet, Encoding, FallbackReason, LabelEncoder,
    OTHERS_CATEGORY,
};
pub use prediction::{max_probability, Prediction, PredictionLabel};
pub use screening::{
    Answer, FeatureVector, ScreeningFeatures, ScreeningRequest, FEATURE_COUNT, FEATURE_NAMES,
    QUESTION_COUNT,
};
