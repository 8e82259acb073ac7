//! Validated text primitives shared across the medrec crates.
//!
//! Contains:
//! - [`NonEmptyText`], a trimmed string that is guaranteed to hold at least one
//!   non-whitespace character (patient names, credentials)
//! - [`lenient`], serde helpers that accept the loose shapes clients and older
//!   store documents use and normalise them to one canonical form

pub mod lenient;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string that is never empty after trimming.
///
/// Construction trims leading and trailing whitespace, so two inputs that differ
/// only in surrounding spaces produce the same value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, or returns [`TextError::Empty`] if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trims every entry and drops the ones that end up empty, keeping order.
pub fn clean_entries<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_owned())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Splits a comma-separated list and cleans the entries.
pub fn split_comma_list(input: &str) -> Vec<String> {
    clean_entries(input.split(','))
}
