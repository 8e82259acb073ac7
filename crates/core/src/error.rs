use std::path::PathBuf;

/// Failures of the backing persistence medium.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read store file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse store file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize patient collection: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to write store file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
