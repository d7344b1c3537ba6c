//! Data models for the contact manager.
//!
//! The contact record is the only persisted entity.

pub mod contact;

pub use contact::{Contact, ValidationRules};
