//! Encoders artifact loader.
//!
//! The artifact is a JSON object keyed by training column name, each entry
//! holding the fitted class list:
//!
//! ```json
//! { "gender": { "classes": ["f", "m"] }, "relation": { "classes": ["Others", "Self"] } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::adapters::artifacts::ArtifactError;
use crate::domain::{CategoricalField, EncoderSet};

/// One fitted label encoder as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEncoder {
    pub classes: Vec<String>,
}

/// Parse an encoders artifact from JSON text.
///
/// Unknown keys are ignored with a warning; missing or invalid encoders fail.
///
/// # Errors
/// Returns `ArtifactError::InvalidEncoders` if any field is missing or invalid.
pub fn parse_encoders(content: &str, path: &Path) -> Result<EncoderSet, ArtifactError> {
    let exported: BTreeMap<String, ExportedEncoder> =
        serde_json::from_str(content).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut classes = HashMap::new();
    for (key, encoder) in exported {
        match CategoricalField::from_artifact_key(&key) {
            Some(field) => {
                classes.insert(field, encoder.classes);
            }
            None => tracing::warn!("Ignoring encoder for unused column {:?}", key),
        }
    }

    Ok(EncoderSet::from_classes(classes)?)
}

/// Load the encoders artifact from disk.
///
/// # Errors
/// Returns `ArtifactError` if the file cannot be read or parsed.
pub fn load_encoders(path: &Path) -> Result<EncoderSet, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let encoders = parse_encoders(&content, path)?;

    tracing::info!(
        "Loaded {} label encoders from {:?}",
        CategoricalField::ALL.len(),
        path
    );
    Ok(encoders)
}
