//! Domain validation errors.

use std::fmt;

/// Errors that can occur during domain value object validation.
///
/// The `Display` output of each variant is the message shown to users, so
/// wording changes here are user-visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The phone number is missing.
    PhoneRequired,

    /// The phone number does not match the international format.
    InvalidPhone(String),

    /// The name is missing or blank.
    NameRequired,

    /// The name contains characters other than letters, spaces and hyphens.
    InvalidNameCharacters(String),

    /// The name is shorter than 2 or longer than 50 characters.
    InvalidNameLength(usize),

    /// The date of birth lies after today.
    FutureDateOfBirth,

    /// The contact is younger than the configured minimum age.
    BelowMinimumAge(u32),

    /// The salary is not a finite number.
    InvalidSalaryFormat,

    /// The salary is zero or negative.
    NonPositiveSalary,
}

impl ValidationError {
    /// Name of the contact field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::PhoneRequired | Self::InvalidPhone(_) => "phone",
            Self::NameRequired | Self::InvalidNameCharacters(_) | Self::InvalidNameLength(_) => {
                "name"
            }
            Self::FutureDateOfBirth | Self::BelowMinimumAge(_) => "dateOfBirth",
            Self::InvalidSalaryFormat | Self::NonPositiveSalary => "salary",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhoneRequired => write!(f, "Phone number is required"),
            Self::InvalidPhone(_) => write!(
                f,
                "Invalid phone number format. Phone numbers must start with a + followed by up to 15 digits"
            ),
            Self::NameRequired => write!(f, "Name is required"),
            Self::InvalidNameCharacters(_) => {
                write!(f, "Name can only contain letters, spaces and hyphens")
            }
            Self::InvalidNameLength(_) => write!(f, "Name must be between 2 and 50 characters"),
            Self::FutureDateOfBirth => write!(f, "Date of Birth cannot be in the future"),
            Self::BelowMinimumAge(years) => write!(f, "You must be at least {} years old", years),
            Self::InvalidSalaryFormat => write!(f, "Invalid salary format."),
            Self::NonPositiveSalary => write!(f, "Salary must be at least $1.00."),
        }
    }
}

impl std::error::Error for ValidationError {}
