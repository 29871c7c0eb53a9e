//! Error taxonomy for the randomancer core.
//!
//! Every variant is recoverable at the session level: callers log and
//! degrade rather than abort the pipeline. Running out of enforcer attempts
//! is not an error at all, see `enforcer::EnforceOutcome`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RandomancerError {
    #[error("Catalog section missing or malformed: {section}")]
    DataIntegrity { section: String },

    #[error("Selection pool is empty: {slot}")]
    EmptyPool { slot: &'static str },

    #[error("None of the catalog paths could be loaded: {}", paths.join(", "))]
    Fetch { paths: Vec<String> },

    #[error("Catalog document not found: {0}")]
    NotFound(PathBuf),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RandomancerError>;
