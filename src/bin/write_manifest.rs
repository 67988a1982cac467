//! Manifest writer for Autiscreen artifacts.
//!
//! Hashes the model and encoder files and writes `manifest.json` next to
//! them, so the app can detect a swapped or truncated artifact at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- [<artifact_dir>]
//! ```
//!
//! File names follow `AUTISCREEN_MODEL_FILE` and `AUTISCREEN_ENCODERS_FILE`;
//! the directory defaults to `AUTISCREEN_ARTIFACT_DIR`.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use autiscreen::adapters::manifest::{build_manifest, write_manifest};
use autiscreen::config::AppConfig;

fn parse_args(default_dir: PathBuf) -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let dir = match args.next() {
        Some(arg) if arg == "--help" || arg == "-h" => {
            println!("Usage: write_manifest [<artifact_dir>]");
            std::process::exit(0);
        }
        Some(arg) => PathBuf::from(arg),
        None => default_dir,
    };
    if let Some(extra) = args.next() {
        return Err(anyhow!("Unexpected argument: {extra}"));
    }
    Ok(dir)
}

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    let dir = parse_args(config.artifacts.dir.clone())?;

    // A file path means "the directory it lives in".
    let dir = if dir.is_file() {
        dir.parent()
            .ok_or_else(|| anyhow!("Artifact path has no parent directory"))?
            .to_path_buf()
    } else {
        dir
    };

    let files = [
        config.artifacts.model_file.as_str(),
        config.artifacts.encoders_file.as_str(),
    ];
    for rel in files {
        if !dir.join(rel).exists() {
            return Err(anyhow!("Missing artifact {rel} in {dir:?}"));
        }
    }

    let manifest = build_manifest(&dir, &files).context("Failed to hash artifacts")?;
    let path = write_manifest(&dir, &manifest).context("Failed to write manifest")?;

    println!("Wrote manifest: {path:?}");
    for (file, digest) in &manifest.files {
        println!("  {file}  sha256={digest}");
    }
    Ok(())
}
