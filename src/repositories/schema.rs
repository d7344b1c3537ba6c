//! Database schema and connection pool setup.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Contacts table. The phone number is the primary key, so the store itself
/// rejects a second contact with the same phone.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS contacts (
    phone TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    date_of_birth DATE NOT NULL,
    married BOOLEAN NOT NULL,
    salary REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(name);
";

/// Create a SQLite connection pool.
///
/// # Errors
///
/// Returns the driver error if the database cannot be opened.
pub async fn create_connection_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .connect(database_url)
        .await
}

/// Create a private in-memory database on a single connection.
///
/// The connection is never recycled, since closing it would discard the
/// database. Intended for tests and benchmarks.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Create the tables if they do not exist yet.
///
/// # Errors
///
/// Returns the driver error if a statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await.map(|_| ())
}
