//! SQL statements shared by the repository and its transaction scope.
//!
//! Every function here runs on a plain connection so the same code serves
//! pooled calls and calls inside an open transaction. Errors are returned
//! raw; callers log them and map them to a store failure category.

use crate::error::{RepositoryError, RepositoryResult, StoreFailure};
use crate::repositories::query::{build_query, placeholders, Condition, Filter, SqlValue};
use crate::repositories::traits::Entity;
use sqlx::sqlite::SqliteConnection;
use sqlx::Row;

/// Store-side paging for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Paging {
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

/// Kind of per-entity write performed by batch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntityWrite {
    Insert,
    Update,
    Delete,
}

/// Log a store error and reduce it to its generic category. A key
/// collision is reported as [`RepositoryError::Conflict`] instead.
pub(crate) fn store_error<T: Entity>(
    operation: &'static str,
    failure: StoreFailure,
    err: sqlx::Error,
) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            tracing::warn!(table = T::TABLE, operation, error = %err, "Key already exists");
            return RepositoryError::Conflict;
        }
    }
    tracing::error!(
        table = T::TABLE,
        operation,
        error = %err,
        "Store operation failed"
    );
    RepositoryError::Store(failure)
}

/// Reject filters naming columns the entity does not have.
pub(crate) fn check_filter<T: Entity>(filter: &Filter<T>) -> RepositoryResult<()> {
    match filter.condition_ref() {
        Some(condition) => condition.ensure_columns(T::COLUMNS),
        None => Ok(()),
    }
}

fn push_where(sql: &mut String, params: &mut Vec<SqlValue>, condition: Option<&Condition>) {
    if let Some(condition) = condition {
        sql.push_str(" WHERE ");
        condition.write_sql(sql, params);
    }
}

pub(crate) fn select_sql<T: Entity>(
    condition: Option<&Condition>,
    paging: Option<Paging>,
) -> (String, Vec<SqlValue>) {
    let mut sql = format!("SELECT {} FROM {}", T::COLUMNS.join(", "), T::TABLE);
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, condition);
    sql.push_str(" ORDER BY ");
    sql.push_str(T::KEY);

    if let Some(paging) = paging {
        // SQLite reads a negative limit as "no limit"
        let take = paging
            .take
            .map_or(-1, |take| i64::try_from(take).unwrap_or(i64::MAX));
        let skip = i64::try_from(paging.skip.unwrap_or(0)).unwrap_or(i64::MAX);
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(SqlValue::Integer(take));
        params.push(SqlValue::Integer(skip));
    }

    (sql, params)
}

pub(crate) fn insert_sql<T: Entity>() -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders(T::COLUMNS.len())
    )
}

pub(crate) fn update_sql<T: Entity>() -> String {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .filter(|column| **column != T::KEY)
        .map(|column| format!("{} = ?", column))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        T::TABLE,
        assignments.join(", "),
        T::KEY
    )
}

/// Parameters for [`update_sql`]: non-key values, then the key.
pub(crate) fn update_params<T: Entity>(entity: &T) -> Vec<SqlValue> {
    let mut params: Vec<SqlValue> = T::COLUMNS
        .iter()
        .zip(entity.to_values())
        .filter(|(column, _)| **column != T::KEY)
        .map(|(_, value)| value)
        .collect();
    params.push(entity.key());
    params
}

pub(crate) fn delete_sql<T: Entity>() -> String {
    format!("DELETE FROM {} WHERE {} = ?", T::TABLE, T::KEY)
}

pub(crate) fn exists_sql<T: Entity>(condition: Option<&Condition>) -> (String, Vec<SqlValue>) {
    let mut sql = format!("SELECT EXISTS(SELECT 1 FROM {}", T::TABLE);
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, condition);
    sql.push(')');
    (sql, params)
}

pub(crate) fn count_sql<T: Entity>(condition: Option<&Condition>) -> (String, Vec<SqlValue>) {
    let mut sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, condition);
    (sql, params)
}

pub(crate) fn update_where_sql<T: Entity>(
    assignments: &[(&'static str, SqlValue)],
    condition: Option<&Condition>,
) -> (String, Vec<SqlValue>) {
    let set: Vec<String> = assignments
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    let mut sql = format!("UPDATE {} SET {}", T::TABLE, set.join(", "));
    let mut params: Vec<SqlValue> = assignments.iter().map(|(_, v)| v.clone()).collect();
    push_where(&mut sql, &mut params, condition);
    (sql, params)
}

pub(crate) fn delete_where_sql<T: Entity>(condition: Option<&Condition>) -> (String, Vec<SqlValue>) {
    let mut sql = format!("DELETE FROM {}", T::TABLE);
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, condition);
    (sql, params)
}

pub(crate) async fn fetch_entities<T: Entity>(
    conn: &mut SqliteConnection,
    condition: Option<&Condition>,
    paging: Option<Paging>,
) -> Result<Vec<T>, sqlx::Error> {
    let (sql, params) = select_sql::<T>(condition, paging);
    let rows = build_query(&sql, params).fetch_all(&mut *conn).await?;
    rows.iter().map(T::from_row).collect()
}

pub(crate) async fn fetch_exists<T: Entity>(
    conn: &mut SqliteConnection,
    condition: Option<&Condition>,
) -> Result<bool, sqlx::Error> {
    let (sql, params) = exists_sql::<T>(condition);
    let row = build_query(&sql, params).fetch_one(&mut *conn).await?;
    let exists: i64 = row.try_get(0)?;
    Ok(exists != 0)
}

pub(crate) async fn fetch_count<T: Entity>(
    conn: &mut SqliteConnection,
    condition: Option<&Condition>,
) -> Result<u64, sqlx::Error> {
    let (sql, params) = count_sql::<T>(condition);
    let row = build_query(&sql, params).fetch_one(&mut *conn).await?;
    let count: i64 = row.try_get(0)?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Run a statement that returns no rows; yields the affected row count.
pub(crate) async fn execute(
    conn: &mut SqliteConnection,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<u64, sqlx::Error> {
    let result = build_query(sql, params).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Apply one entity write; yields the affected row count.
pub(crate) async fn write_entity<T: Entity>(
    conn: &mut SqliteConnection,
    write: EntityWrite,
    entity: &T,
) -> Result<u64, sqlx::Error> {
    match write {
        EntityWrite::Insert => execute(conn, &insert_sql::<T>(), entity.to_values()).await,
        EntityWrite::Update => execute(conn, &update_sql::<T>(), update_params(entity)).await,
        EntityWrite::Delete => execute(conn, &delete_sql::<T>(), vec![entity.key()]).await,
    }
}
