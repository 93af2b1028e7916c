// src/errors.rs

//! Crate-wide error type for the scenario driver.
//!
//! The core layers have their own narrower errors (`DecodeError`,
//! `WatchError`, `OrchestrationError`); this enum wraps them together with
//! configuration, staging and assertion failures.

use std::time::Duration;

use thiserror::Error;

use crate::engine::OrchestrationError;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Staging error: {0}")]
    Staging(String),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error("run did not finish within {0:?}")]
    Timeout(Duration),

    #[error("expected refs missing after run: {}", .0.join(", "))]
    MissingRefs(Vec<String>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, E2eError>;
