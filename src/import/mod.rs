//! CSV import of contact records.
//!
//! Turns an uploaded comma-separated file into contact candidates. Parsing
//! is best-effort: rows that cannot be read are skipped and reported, never
//! fatal. Candidates are not validated here; that is the caller's job.

mod csv_reader;

pub use csv_reader::{parse_contacts, CsvImport, SkipReason, SkippedRow, EXPECTED_HEADER};
