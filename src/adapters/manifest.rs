//! Artifact manifest: SHA-256 digests binding the model and encoder files.
//!
//! A manifest lets the app detect truncated or swapped artifacts before any
//! screening is served. It is optional unless `AUTISCREEN_REQUIRE_MANIFEST`
//! is set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::adapters::artifacts::ArtifactError;

/// File name of the manifest inside the artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Relative file name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

fn sha256_hex(path: &Path) -> Result<String, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Hash the given files in `dir` into a fresh manifest.
///
/// # Errors
/// Returns `ArtifactError::Io` if any file cannot be read.
pub fn build_manifest(dir: &Path, files: &[&str]) -> Result<ArtifactManifest, ArtifactError> {
    let mut digests = BTreeMap::new();
    for rel in files {
        digests.insert((*rel).to_string(), sha256_hex(&dir.join(rel))?);
    }
    Ok(ArtifactManifest {
        version: MANIFEST_VERSION,
        created_at: chrono::Utc::now(),
        files: digests,
    })
}

/// Write a manifest into `dir`, returning its path.
///
/// # Errors
/// Returns `ArtifactError` on serialization or write failure.
pub fn write_manifest(dir: &Path, manifest: &ArtifactManifest) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = serde_json::to_vec_pretty(manifest).map_err(|source| ArtifactError::Parse {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, bytes).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Verify the manifest in `dir`, if any.
///
/// Every file listed must hash-match, and every name in `bound` must be listed.
/// Returns `Ok(None)` when no manifest exists and `require` is false.
///
/// # Errors
/// Returns `ArtifactError` if the manifest is required but absent, malformed,
/// incomplete, or a digest does not match.
pub fn verify_manifest(
    dir: &Path,
    bound: &[&str],
    require: bool,
) -> Result<Option<ArtifactManifest>, ArtifactError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        if require {
            tracing::error!("Artifact manifest not found at {:?}", path);
            return Err(ArtifactError::ManifestRequired(path));
        }
        tracing::warn!("No artifact manifest at {:?}; skipping integrity check", path);
        return Ok(None);
    }

    let content = std::fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    let manifest: ArtifactManifest =
        serde_json::from_slice(&content).map_err(|source| ArtifactError::Parse {
            path: path.clone(),
            source,
        })?;

    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Manifest(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    for name in bound {
        if !manifest.files.contains_key(*name) {
            return Err(ArtifactError::Manifest(format!("{name} is not bound by the manifest")));
        }
    }

    for (rel, expected) in &manifest.files {
        let actual = sha256_hex(&dir.join(rel))?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ArtifactError::HashMismatch { file: rel.clone() });
        }
    }

    tracing::info!("Artifact manifest verified ({} files)", manifest.files.len());
    Ok(Some(manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_artifacts(dir: &Path) {
        std::fs::write(dir.join("best_model.json"), b"{\"model\":1}").unwrap();
        std::fs::write(dir.join("encoders.json"), b"{\"enc\":2}").unwrap();
    }

    const BOUND: [&str; 2] = ["best_model.json", "encoders.json"];

    #[test]
    fn test_roundtrip_verifies() {
        let temp = tempdir().unwrap();
        write_artifacts(temp.path());
        let manifest = build_manifest(temp.path(), &BOUND).unwrap();
        write_manifest(temp.path(), &manifest).unwrap();

        let verified = verify_manifest(temp.path(), &BOUND, true).unwrap();
        assert_eq!(verified, Some(manifest));
    }

    #[test]
    fn test_tampered_file_is_rejected() {
        let temp = tempdir().unwrap();
        write_artifacts(temp.path());
        let manifest = build_manifest(temp.path(), &BOUND).unwrap();
        write_manifest(temp.path(), &manifest).unwrap();

        std::fs::write(temp.path().join("encoders.json"), b"{\"enc\":3}").unwrap();
        let err = verify_manifest(temp.path(), &BOUND, false).unwrap_err();
        assert!(matches!(err, ArtifactError::HashMismatch { ref file } if file == "encoders.json"));
    }

    #[test]
    fn test_manifest_must_bind_both_artifacts() {
        let temp = tempdir().unwrap();
        write_artifacts(temp.path());
        let manifest = build_manifest(temp.path(), &["best_model.json"]).unwrap();
        write_manifest(temp.path(), &manifest).unwrap();

        let err = verify_manifest(temp.path(), &BOUND, false).unwrap_err();
        assert!(err.to_string().contains("encoders.json"));
    }

    #[test]
    fn test_missing_manifest() {
        let temp = tempdir().unwrap();
        write_artifacts(temp.path());
        assert_eq!(verify_manifest(temp.path(), &BOUND, false).unwrap(), None);
        assert!(matches!(
            verify_manifest(temp.path(), &BOUND, true),
            Err(ArtifactError::ManifestRequired(_))
        ));
    }
}
