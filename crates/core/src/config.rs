//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services, so request handling never depends on process-wide environment state.

use crate::constants::DEFAULT_DATA_FILE;
use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_file: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_file: PathBuf) -> PatientResult<Self> {
        if data_file.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "data file path cannot be empty".into(),
            ));
        }

        Ok(Self { data_file })
    }

    /// Path of the JSON document holding the patient collection.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }
}

/// Resolve the data file path from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATA_FILE`].
pub fn data_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
}
