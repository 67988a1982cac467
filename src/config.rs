//! Runtime configuration read from the environment.

use std::path::{Path, PathBuf};

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(&self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Location of the two read-only artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub encoders_file: String,
    pub require_manifest: bool,
}

impl ArtifactConfig {
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    #[must_use]
    pub fn encoders_path(&self) -> PathBuf {
        self.dir.join(&self.encoders_file)
    }

    /// Artifacts under `dir` with default file names.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            encoders_file: DEFAULT_ENCODERS_FILE.to_string(),
            require_manifest: false,
        }
    }
}

pub const DEFAULT_ARTIFACT_DIR: &str = "models";
pub const DEFAULT_MODEL_FILE: &str = "best_model.json";
pub const DEFAULT_ENCODERS_FILE: &str = "encoders.json";
pub const DEFAULT_LOG_FILE: &str = "autiscreen.log";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub artifacts: ArtifactConfig,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Build configuration from `AUTISCREEN_*` variables, with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Directory that must exist before the log file can be opened.
    ///
    /// `None` for a bare file name, which lives in the working directory.
    #[must_use]
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let artifacts = ArtifactConfig {
            dir: non_empty("AUTISCREEN_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR)),
            model_file: non_empty("AUTISCREEN_MODEL_FILE")
                .unwrap_or_else(|| DEFAULT_MODEL_FILE.to_string()),
            encoders_file: non_empty("AUTISCREEN_ENCODERS_FILE")
                .unwrap_or_else(|| DEFAULT_ENCODERS_FILE.to_string()),
            require_manifest: lookup("AUTISCREEN_REQUIRE_MANIFEST")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
        };

        Self {
            artifacts,
            log_mode: lookup("AUTISCREEN_LOG_MODE")
                .map(|v| LogMode::parse(&v))
                .unwrap_or(LogMode::Auto),
            log_file: non_empty("AUTISCREEN_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_log_dir() {
        assert_eq!(config(&[]).log_dir(), None);

        let cfg = config(&[("AUTISCREEN_LOG_FILE", "/var/log/autiscreen/app.log")]);
        assert_eq!(cfg.log_dir(), Some(Path::new("/var/log/autiscreen")));
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.artifacts.model_path(), PathBuf::from("models/best_model.json"));
        assert_eq!(cfg.artifacts.encoders_path(), PathBuf::from("models/encoders.json"));
        assert!(!cfg.artifacts.require_manifest);
        assert_eq!(cfg.log_mode, LogMode::Auto);
        assert_eq!(cfg.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("AUTISCREEN_ARTIFACT_DIR", "/srv/artifacts"),
            ("AUTISCREEN_MODEL_FILE", "rf.json"),
            ("AUTISCREEN_REQUIRE_MANIFEST", "yes"),
            ("AUTISCREEN_LOG_MODE", "STDOUT"),
        ]);
        assert_eq!(cfg.artifacts.model_path(), PathBuf::from("/srv/artifacts/rf.json"));
        assert!(cfg.artifacts.require_manifest);
        assert_eq!(cfg.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = config(&[("AUTISCREEN_ARTIFACT_DIR", "  ")]);
        assert_eq!(cfg.artifacts.dir, PathBuf::from(DEFAULT_ARTIFACT_DIR));
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
