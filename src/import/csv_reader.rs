//! Line-oriented CSV reader for contact uploads.
//!
//! Supported layout: one record per line, fields separated by commas, in the
//! order `Name,DateOfBirth,Married,Phone,Salary`. An optional header line
//! with exactly those tokens is skipped. Quoting and escaped commas are not
//! supported.

use crate::error::ImportResult;
use crate::models::Contact;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Header tokens recognised on the first line.
pub const EXPECTED_HEADER: [&str; 5] = ["Name", "DateOfBirth", "Married", "Phone", "Salary"];

const FIELD_COUNT: usize = EXPECTED_HEADER.len();

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Outcome of reading a CSV upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvImport {
    /// Parsed records, in file order, not yet validated
    pub candidates: Vec<Contact>,

    /// Data rows that could not be parsed
    pub skipped: Vec<SkippedRow>,
}

impl CsvImport {
    /// True when the file produced neither candidates nor skipped rows.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.skipped.is_empty()
    }
}

/// A data row that was dropped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the uploaded file
    pub line: usize,

    /// Why the row was dropped
    pub reason: SkipReason,
}

/// Reason a CSV row was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than five comma-separated fields (the count found)
    TooFewFields(usize),

    /// The date of birth field is not a recognised date
    InvalidDate(String),

    /// The married field is not `true` or `false`
    InvalidBoolean(String),

    /// The salary field is not a number
    InvalidSalary(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewFields(found) => {
                write!(f, "expected {} fields, found {}", FIELD_COUNT, found)
            }
            Self::InvalidDate(value) => write!(f, "invalid date of birth '{}'", value),
            Self::InvalidBoolean(value) => write!(f, "invalid married flag '{}'", value),
            Self::InvalidSalary(value) => write!(f, "invalid salary '{}'", value),
        }
    }
}

/// Parse raw upload bytes into contact candidates.
///
/// An empty file, or one holding only a header, yields an empty import.
///
/// # Errors
///
/// Returns `ImportError::Encoding` if the bytes are not UTF-8.
pub fn parse_contacts(bytes: &[u8]) -> ImportResult<CsvImport> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut import = CsvImport::default();

    for (index, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

        if index == 0 && is_header(line) {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(line) {
            Ok(contact) => import.candidates.push(contact),
            Err(reason) => {
                tracing::debug!(line = index + 1, %reason, "Skipping CSV row");
                import.skipped.push(SkippedRow {
                    line: index + 1,
                    reason,
                });
            }
        }
    }

    Ok(import)
}

fn is_header(line: &str) -> bool {
    line.split(',').eq(EXPECTED_HEADER.iter().copied())
}

fn parse_row(line: &str) -> Result<Contact, SkipReason> {
    let fields: Vec<&str> = line.split(',').collect();

    let [name, date_of_birth, married, phone, salary, ..] = fields.as_slice() else {
        return Err(SkipReason::TooFewFields(fields.len()));
    };

    let date_of_birth = parse_date(date_of_birth)
        .ok_or_else(|| SkipReason::InvalidDate(date_of_birth.trim().to_string()))?;
    let married =
        parse_bool(married).ok_or_else(|| SkipReason::InvalidBoolean(married.trim().to_string()))?;
    let salary =
        parse_salary(salary).ok_or_else(|| SkipReason::InvalidSalary(salary.trim().to_string()))?;

    Ok(Contact::new(
        phone.trim(),
        name.trim(),
        date_of_birth,
        married,
        salary,
    ))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|date_time| date_time.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date_time| date_time.date_naive())
        })
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_salary(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}
