// src/config/mod.rs

//! Scenario configuration.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a scenario file from disk.
//! - `validate.rs`: address, peer, milestone and ref checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str, DEFAULT_SCENARIO_PATH};
pub use model::{NetworkSection, NodeSection, RawScenarioFile, ScenarioFile};
pub use validate::validate_scenario;
