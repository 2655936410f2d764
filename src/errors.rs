use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ColumnName, Platform};

/// Error type for credential, lookup, parsing, and persistence failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("credentials for {platform} are unavailable: {reason}")]
    Credential { platform: Platform, reason: String },
    #[error("{platform} lookup '{endpoint}' failed: {reason}")]
    Lookup {
        platform: Platform,
        endpoint: String,
        reason: String,
    },
    #[error("required input {} could not be read: {source}", path.display())]
    InputUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("input {} is malformed: {details}", path.display())]
    MalformedInput { path: PathBuf, details: String },
    #[error("table has no column '{0}'")]
    MissingColumn(ColumnName),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
