//! Persistence mapping for [`Contact`].

use crate::models::Contact;
use crate::repositories::query::{Condition, Filter, SqlValue};
use crate::repositories::traits::Entity;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Column names of the `contacts` table.
pub mod columns {
    pub const PHONE: &str = "phone";
    pub const NAME: &str = "name";
    pub const DATE_OF_BIRTH: &str = "date_of_birth";
    pub const MARRIED: &str = "married";
    pub const SALARY: &str = "salary";
}

use columns::{DATE_OF_BIRTH, MARRIED, NAME, PHONE, SALARY};

impl Entity for Contact {
    const TABLE: &'static str = "contacts";
    const KEY: &'static str = PHONE;
    const COLUMNS: &'static [&'static str] = &[PHONE, NAME, DATE_OF_BIRTH, MARRIED, SALARY];

    fn key(&self) -> SqlValue {
        SqlValue::Text(self.phone.clone())
    }

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.phone.clone()),
            SqlValue::Text(self.name.clone()),
            SqlValue::Date(self.date_of_birth),
            SqlValue::Bool(self.married),
            SqlValue::Real(self.salary),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            phone: row.try_get(PHONE)?,
            name: row.try_get(NAME)?,
            date_of_birth: row.try_get(DATE_OF_BIRTH)?,
            married: row.try_get(MARRIED)?,
            salary: row.try_get(SALARY)?,
        })
    }
}

impl Contact {
    /// Filter selecting the contact with the given phone number.
    pub fn by_phone(phone: impl Into<String>) -> Filter<Contact> {
        Filter::condition(Condition::eq(PHONE, phone.into()))
    }
}
