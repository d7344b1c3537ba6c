//! Domain value objects and validation rules.
//!
//! Each value object validates at construction time, so a `PhoneNumber`,
//! `PersonName`, `DateOfBirth` or `Salary` in hand is always well-formed.
//! `Contact::validate` in the models module runs all of them against a
//! candidate record.

pub mod date_of_birth;
pub mod errors;
pub mod name;
pub mod phone;
pub mod salary;

pub use date_of_birth::DateOfBirth;
pub use errors::ValidationError;
pub use name::PersonName;
pub use phone::PhoneNumber;
pub use salary::Salary;
