// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawScenarioFile, ScenarioFile};
use crate::errors::Result;

/// Load a scenario file and return the raw, unvalidated `RawScenarioFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawScenarioFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawScenarioFile> {
    let raw: RawScenarioFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a scenario file from `path` and validate it.
///
/// - Reads TOML and applies defaults (`serde`).
/// - Checks addresses, milestone lists, the replicator's bootstrap peer and
///   the expected ref paths.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ScenarioFile> {
    let raw = load_from_path(&path)?;
    ScenarioFile::try_from(raw)
}

/// Scenario used when `--scenario` is not given.
pub const DEFAULT_SCENARIO_PATH: &str = "scenarios/issue782.toml";
