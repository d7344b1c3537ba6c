//! PersonName value object.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s\-]+$").expect("name pattern is a valid regex"));

/// Shortest accepted name, in characters.
pub const MIN_NAME_LENGTH: usize = 2;

/// Longest accepted name, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

/// A contact's display name: letters, spaces and hyphens, 2 to 50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonName(String);

impl PersonName {
    /// Create a new PersonName.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// presence, then character set, then length.
    ///
    /// # Errors
    ///
    /// Returns `NameRequired`, `InvalidNameCharacters` or `InvalidNameLength`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }

        if !NAME_PATTERN.is_match(&name) {
            return Err(ValidationError::InvalidNameCharacters(name));
        }

        let length = name.chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&length) {
            return Err(ValidationError::InvalidNameLength(length));
        }

        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
