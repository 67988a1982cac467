//! Adapters layer: Concrete implementations of ports and artifact I/O.
//!
//! - `model`: JSON-exported estimators implementing `Classifier`
//! - `encoders`: label encoders artifact
//! - `manifest`: SHA-256 integrity manifest
//! - `artifacts`: startup loading of all of the above
//! - `sanitize`: redaction of screening values in logs

pub mod artifacts;
pub mod encoders;
pub mod manifest;
pub mod model;
pub mod sanitize;

pub use artifacts::{load_artifacts, ArtifactError};
