//! PhoneNumber value object.

use super::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// `+`, a non-zero leading digit, then 1 to 14 more ASCII digits.
static PHONE_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("phone pattern is a valid regex"));

/// A type-safe wrapper for international phone numbers.
///
/// The phone number is the identity key of a contact, so it is kept exactly
/// as entered (no normalisation) once it passes validation.
///
/// # Example
///
/// ```
/// use contact_manager::domain::PhoneNumber;
///
/// let phone = PhoneNumber::new("+15551234567").unwrap();
/// assert_eq!(phone.as_str(), "+15551234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Create a new PhoneNumber, validating the format.
    ///
    /// # Validation Rules
    ///
    /// - Must not be empty
    /// - Must start with `+`
    /// - The first digit after `+` must not be zero
    /// - 2 to 15 digits in total, nothing else
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PhoneRequired` for an empty string and
    /// `ValidationError::InvalidPhone` if the format is invalid.
    pub fn new(phone: impl Into<String>) -> Result<Self, ValidationError> {
        let phone = phone.into();

        if phone.is_empty() {
            return Err(ValidationError::PhoneRequired);
        }

        if !PHONE_NUMBER_PATTERN.is_match(&phone) {
            return Err(ValidationError::InvalidPhone(phone));
        }

        Ok(Self(phone))
    }

    /// Get the phone number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
