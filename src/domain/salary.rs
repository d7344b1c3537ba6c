//! Salary value object.

use super::errors::ValidationError;

/// A strictly positive, finite salary amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Salary(f64);

impl Salary {
    /// Create a new Salary.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSalaryFormat` for NaN or infinite values and
    /// `NonPositiveSalary` for zero or negative amounts.
    pub fn new(amount: f64) -> Result<Self, ValidationError> {
        if !amount.is_finite() {
            return Err(ValidationError::InvalidSalaryFormat);
        }
        if amount <= 0.0 {
            return Err(ValidationError::NonPositiveSalary);
        }
        Ok(Self(amount))
    }
}
