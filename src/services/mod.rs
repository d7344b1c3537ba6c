//! Application service layer.
//!
//! Services hold the business rules and sit between the HTTP handlers and
//! the data access layer.

mod contact_service;

pub use contact_service::{ContactService, ContactServiceImpl};
