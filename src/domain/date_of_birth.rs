//! DateOfBirth value object.

use super::errors::ValidationError;
use chrono::{Datelike, NaiveDate};

/// A date of birth that is not in the future and satisfies a minimum age.
///
/// Validation is relative to an explicit `today` so callers decide which
/// clock (and time zone) applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateOfBirth(NaiveDate);

impl DateOfBirth {
    /// Validate `date` as of `today` against `minimum_age` whole years.
    ///
    /// # Errors
    ///
    /// Returns `FutureDateOfBirth` if `date` is after `today`, and
    /// `BelowMinimumAge` if the person has not yet turned `minimum_age`.
    pub fn new(
        date: NaiveDate,
        today: NaiveDate,
        minimum_age: u32,
    ) -> Result<Self, ValidationError> {
        if date > today {
            return Err(ValidationError::FutureDateOfBirth);
        }

        if age_on(date, today) < minimum_age {
            return Err(ValidationError::BelowMinimumAge(minimum_age));
        }

        Ok(Self(date))
    }
}

/// Whole years between `birth` and `today`, counting a birthday only once
/// it has been reached. Returns 0 when `birth` is after `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_future_dates() {
        let today = date(2024, 6, 15);
        assert_eq!(
            DateOfBirth::new(date(2024, 6, 16), today, 0),
            Err(ValidationError::FutureDateOfBirth)
        );
        assert_eq!(
            DateOfBirth::new(date(2030, 1, 1), today, 0),
            Err(ValidationError::FutureDateOfBirth)
        );
    }

    #[test]
    fn test_accepts_today_and_past() {
        let today = date(2024, 6, 15);
        assert!(DateOfBirth::new(today, today, 0).is_ok());
        assert!(DateOfBirth::new(date(1990, 1, 1), today, 0).is_ok());
    }

    #[test]
    fn test_minimum_age_counts_birthday() {
        let today = date(2024, 6, 15);
        // turns 18 tomorrow
        assert_eq!(
            DateOfBirth::new(date(2006, 6, 16), today, 18),
            Err(ValidationError::BelowMinimumAge(18))
        );
        // turned 18 today
        assert!(DateOfBirth::new(date(2006, 6, 15), today, 18).is_ok());
    }

    #[test]
    fn test_age_on() {
        let today = date(2024, 2, 28);
        assert_eq!(age_on(date(2000, 2, 29), today), 23);
        assert_eq!(age_on(date(2000, 2, 28), today), 24);
        assert_eq!(age_on(date(2025, 1, 1), today), 0);
    }
}
