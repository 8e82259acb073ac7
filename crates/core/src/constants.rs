//! Constants used throughout the medrec core crate.
//!
//! This module contains the default file names and environment variable names so
//! that the binaries and the services agree on them.

/// Default path of the JSON document holding the whole patient collection.
pub const DEFAULT_DATA_FILE: &str = "informacion_medica.json";

/// Environment variable overriding [`DEFAULT_DATA_FILE`].
pub const DATA_FILE_ENV: &str = "MEDREC_DATA_FILE";

/// Indentation used when writing the store document.
pub const STORE_INDENT: &[u8] = b"    ";
