//! Contact model: the single record kept by the contact manager.

use crate::domain::{DateOfBirth, PersonName, PhoneNumber, Salary, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A contact record, keyed by its phone number.
///
/// Fields are plain values so that a record can exist before it has been
/// validated (for example a CSV candidate). Use [`Contact::validate`] before
/// handing a record to the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// International phone number; the identity key of the record
    pub phone: String,

    /// Display name
    pub name: String,

    /// Calendar date of birth
    pub date_of_birth: NaiveDate,

    /// Marital status
    pub married: bool,

    /// Salary amount
    pub salary: f64,
}

/// Tunable parameters of the field validation rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationRules {
    /// Minimum age in whole years (0 disables the check)
    pub minimum_age: u32,
}

impl ValidationRules {
    /// Rules requiring the given minimum age.
    pub fn with_minimum_age(minimum_age: u32) -> Self {
        Self { minimum_age }
    }
}

impl Contact {
    /// Create a new contact.
    pub fn new(
        phone: impl Into<String>,
        name: impl Into<String>,
        date_of_birth: NaiveDate,
        married: bool,
        salary: f64,
    ) -> Self {
        Self {
            phone: phone.into(),
            name: name.into(),
            date_of_birth,
            married,
            salary,
        }
    }

    /// Run every field rule against this record as of `today`.
    ///
    /// All failing fields are reported, one error per field, in field order
    /// (phone, name, date of birth, salary).
    ///
    /// # Errors
    ///
    /// Returns the list of field failures when at least one rule rejects.
    pub fn validate(
        &self,
        rules: &ValidationRules,
        today: NaiveDate,
    ) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = [
            PhoneNumber::new(self.phone.as_str()).err(),
            PersonName::new(self.name.as_str()).err(),
            DateOfBirth::new(self.date_of_birth, today, rules.minimum_age).err(),
            Salary::new(self.salary).err(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
