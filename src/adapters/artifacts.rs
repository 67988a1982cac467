//! Startup loading of the read-only artifacts.

use std::path::PathBuf;

use crate::adapters::encoders::load_encoders;
use crate::adapters::manifest::verify_manifest;
use crate::adapters::model::JsonClassifier;
use crate::config::ArtifactConfig;
use crate::domain::{EncoderError, EncoderSet};

/// Errors raised while loading artifacts. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid encoders: {0}")]
    InvalidEncoders(#[from] EncoderError),

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("artifact manifest required but not found at {0:?}")]
    ManifestRequired(PathBuf),

    #[error("file hash mismatch for {file}")]
    HashMismatch { file: String },
}

/// Verify and load the model and encoders described by `config`.
///
/// # Errors
/// Returns the first `ArtifactError` encountered.
pub fn load_artifacts(config: &ArtifactConfig) -> Result<(JsonClassifier, EncoderSet), ArtifactError> {
    tracing::info!("Loading artifacts from {:?}", config.dir);

    verify_manifest(
        &config.dir,
        &[config.model_file.as_str(), config.encoders_file.as_str()],
        config.require_manifest,
    )?;

    let classifier = JsonClassifier::load(&config.model_path())?;
    let encoders = load_encoders(&config.encoders_path())?;
    Ok((classifier, encoders))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::manifest::{build_manifest, write_manifest};
    use crate::domain::CategoricalField;
    use crate::ports::Classifier;

    #[test]
    fn test_load_bundled_artifacts() {
        let (classifier, encoders) =
            load_artifacts(&ArtifactConfig::in_dir("models")).expect("bundled artifacts load");
        assert_eq!(classifier.n_features(), 19);
        assert!(!encoders.get(CategoricalField::Ethnicity).classes().is_empty());
    }

    #[test]
    fn test_required_manifest_over_copied_artifacts() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["best_model.json", "encoders.json"] {
            std::fs::copy(format!("models/{name}"), temp.path().join(name)).unwrap();
        }
        let mut config = ArtifactConfig::in_dir(temp.path());
        config.require_manifest = true;

        assert!(matches!(
            load_artifacts(&config),
            Err(ArtifactError::ManifestRequired(_))
        ));

        let manifest = build_manifest(temp.path(), &["best_model.json", "encoders.json"]).unwrap();
        write_manifest(temp.path(), &manifest).unwrap();
        assert!(load_artifacts(&config).is_ok());
    }

    #[test]
    fn test_missing_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let config = ArtifactConfig::in_dir(temp.path().join("absent"));
        assert!(matches!(load_artifacts(&config), Err(ArtifactError::Io { .. })));
    }
}
