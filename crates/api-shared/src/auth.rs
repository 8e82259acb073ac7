//! API key access gateway.
//!
//! The set of valid keys is the union of every configured [`KeySource`]. It is
//! recomputed on every check, so adding or revoking a key (in the environment
//! or in the key file) takes effect on the next request without a restart.
//! All keys are equal: there is no per-key scoping, expiry or rate limiting.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable holding a comma-separated list of API keys.
pub const API_KEYS_ENV: &str = "API_KEYS";

/// Environment variable overriding [`DEFAULT_KEYS_FILE`].
pub const KEYS_FILE_ENV: &str = "MEDREC_KEYS_FILE";

/// Default side file holding additional keys as `{"keys": [...]}`.
pub const DEFAULT_KEYS_FILE: &str = "api_keys.json";

/// Request header carrying the credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying the credential when no header is sent.
pub const API_KEY_QUERY_PARAM: &str = "api_key";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing API key")]
    Missing,
    #[error("Invalid API key")]
    Invalid,
}

/// A provider of currently valid API keys.
pub trait KeySource: Send + Sync + fmt::Debug {
    fn keys(&self) -> Vec<String>;
}

/// Splits a comma-separated key list, dropping blank entries.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Keys fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticKeys(Vec<String>);

impl StaticKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }
}

impl KeySource for StaticKeys {
    fn keys(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Comma-separated keys read from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvKeySource {
    var: String,
}

impl EnvKeySource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl KeySource for EnvKeySource {
    fn keys(&self) -> Vec<String> {
        std::env::var(&self.var)
            .map(|raw| parse_key_list(&raw))
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct KeyFile {
    #[serde(default)]
    keys: Vec<String>,
}

/// Keys read from a JSON side file on every call.
///
/// The file is optional. A missing, unreadable or malformed file contributes no
/// keys and never fails the check.
#[derive(Debug, Clone)]
pub struct KeyFileSource {
    path: PathBuf,
}

impl KeyFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KeySource for KeyFileSource {
    fn keys(&self) -> Vec<String> {
        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("key file {} not present", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("ignoring unreadable key file {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<KeyFile>(&contents) {
            Ok(file) => StaticKeys(file.keys).keys(),
            Err(e) => {
                tracing::warn!("ignoring malformed key file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Resolve the key file path from an optional environment value.
pub fn keys_file_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_KEYS_FILE))
}

/// Authorises credentials against the union of its key sources.
#[derive(Clone, Debug)]
pub struct ApiKeyGateway {
    sources: Vec<Arc<dyn KeySource>>,
}

impl ApiKeyGateway {
    pub fn new(sources: Vec<Arc<dyn KeySource>>) -> Self {
        Self { sources }
    }

    /// Gateway over the `API_KEYS` environment variable and the key file at
    /// `keys_file`.
    pub fn with_env_and_file(keys_file: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Arc::new(EnvKeySource::new(API_KEYS_ENV)),
            Arc::new(KeyFileSource::new(keys_file)),
        ])
    }

    /// The union of all sources, computed now.
    pub fn valid_keys(&self) -> HashSet<String> {
        self.sources.iter().flat_map(|s| s.keys()).collect()
    }

    pub fn is_authorized(&self, credential: &str) -> bool {
        !credential.is_empty() && self.valid_keys().contains(credential)
    }

    /// Checks the credential before any protected operation runs.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Missing`] if no credential (or an empty one) was supplied
    /// - [`AuthError::Invalid`] if the credential is not currently valid
    pub fn authorize(&self, credential: Option<&str>) -> Result<(), AuthError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::Missing)?;

        if self.is_authorized(credential) {
            Ok(())
        } else {
            tracing::warn!("rejected request with unknown API key");
            Err(AuthError::Invalid)
        }
    }
}
