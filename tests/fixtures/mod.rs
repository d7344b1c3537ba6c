//! Test fixtures and sample data.
//!
//! Builds contacts and in-memory SQLite repositories for integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use contact_manager::repositories::schema::{create_memory_pool, init_schema};
use contact_manager::{Contact, SqliteRepository};

/// Shorthand for a calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Phone number for the `n`th generated contact.
pub fn phone(n: usize) -> String {
    format!("+1555{:07}", n)
}

/// A contact that passes every validation rule.
pub fn sample_contact(phone: &str, name: &str) -> Contact {
    Contact::new(phone, name, date(1990, 1, 1), false, 50_000.0)
}

/// `count` distinct contacts with increasing salaries, married on even numbers.
pub fn numbered_contacts(count: usize) -> Vec<Contact> {
    (0..count)
        .map(|n| {
            Contact::new(
                phone(n),
                format!("Person {}", n),
                date(1980 + (n % 20) as i32, 1, 1),
                n % 2 == 0,
                1_000.0 * (n + 1) as f64,
            )
        })
        .collect()
}

/// Repository over a fresh in-memory database with the schema applied.
pub async fn memory_repository() -> SqliteRepository<Contact> {
    let pool = create_memory_pool()
        .await
        .expect("in-memory database should open");
    init_schema(&pool).await.expect("schema should apply");
    SqliteRepository::new(pool)
}

/// Make every following store call fail.
pub async fn break_store(repository: &SqliteRepository<Contact>) {
    sqlx::query("DROP TABLE contacts")
        .execute(repository.pool())
        .await
        .expect("table should drop");
}
