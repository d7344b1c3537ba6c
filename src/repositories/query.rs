//! Query building blocks for the generic repository.
//!
//! Filtering has two halves. A [`Condition`] is rendered into the SQL
//! `WHERE` clause and evaluated by the store; a predicate closure is
//! evaluated in memory on decoded entities. Either, both or neither may be
//! present in a [`Filter`].

use crate::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A value bound into a SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<V: Into<SqlValue>> From<Option<V>> for SqlValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Bind one value onto a query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Date(v) => query.bind(v),
    }
}

/// Build a query from SQL text and its positional parameters.
pub(crate) fn build_query(
    sql: &str,
    params: Vec<SqlValue>,
) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    params.into_iter().fold(sqlx::query(sql), bind_value)
}

/// Comparison operator of a [`Condition::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// A store-side filter condition.
///
/// Column names are checked against the entity's column list before any SQL
/// is produced, so only known identifiers ever reach the statement text.
///
/// # Example
///
/// ```
/// use contact_manager::repositories::Condition;
///
/// let condition = Condition::eq("married", true).and(Condition::gt("salary", 1000.0));
/// assert_eq!(condition.columns(), vec!["married", "salary"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: &'static str,
        op: Comparison,
        value: SqlValue,
    },
    In {
        column: &'static str,
        values: Vec<SqlValue>,
    },
    IsNull(&'static str),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    fn compare(column: &'static str, op: Comparison, value: impl Into<SqlValue>) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Eq, value)
    }

    pub fn ne(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ne, value)
    }

    pub fn lt(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Lt, value)
    }

    pub fn le(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Le, value)
    }

    pub fn gt(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Gt, value)
    }

    pub fn ge(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, Comparison::Ge, value)
    }

    /// Column value is one of `values`. An empty list matches nothing.
    pub fn is_in<V: Into<SqlValue>>(
        column: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(column: &'static str) -> Self {
        Self::IsNull(column)
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::And(mut all) => {
                all.push(other);
                Self::And(all)
            }
            first => Self::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Or(mut any) => {
                any.push(other);
                Self::Or(any)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every column referenced by this condition, in order of appearance.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::Compare { column, .. } | Self::In { column, .. } | Self::IsNull(column) => {
                out.push(*column)
            }
            Self::And(parts) | Self::Or(parts) => {
                parts.iter().for_each(|part| part.collect_columns(out))
            }
            Self::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Reject conditions that name a column outside `allowed`.
    pub(crate) fn ensure_columns(&self, allowed: &[&str]) -> RepositoryResult<()> {
        match self.columns().into_iter().find(|c| !allowed.contains(c)) {
            Some(unknown) => Err(RepositoryError::invalid_argument(
                "filter",
                format!("unknown column '{}'", unknown),
            )),
            None => Ok(()),
        }
    }

    /// Render into SQL, appending positional parameters to `params`.
    pub(crate) fn write_sql(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        match self {
            Self::Compare { column, op, value } => {
                sql.push_str(column);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                params.push(value.clone());
            }
            Self::In { values, .. } if values.is_empty() => sql.push('0'),
            Self::In { column, values } => {
                sql.push_str(column);
                sql.push_str(" IN (");
                sql.push_str(&placeholders(values.len()));
                sql.push(')');
                params.extend(values.iter().cloned());
            }
            Self::IsNull(column) => {
                sql.push_str(column);
                sql.push_str(" IS NULL");
            }
            Self::And(parts) => write_joined(parts, " AND ", '1', sql, params),
            Self::Or(parts) => write_joined(parts, " OR ", '0', sql, params),
            Self::Not(inner) => {
                sql.push_str("NOT (");
                inner.write_sql(sql, params);
                sql.push(')');
            }
        }
    }
}

fn write_joined(
    parts: &[Condition],
    separator: &str,
    empty: char,
    sql: &mut String,
    params: &mut Vec<SqlValue>,
) {
    if parts.is_empty() {
        sql.push(empty);
        return;
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            sql.push_str(separator);
        }
        sql.push('(');
        part.write_sql(sql, params);
        sql.push(')');
    }
}

/// `?, ?, ?` for `count` parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Selects entities by a store-side condition and/or an in-memory predicate.
///
/// The default filter matches everything.
pub struct Filter<T> {
    condition: Option<Condition>,
    predicate: Option<Predicate<T>>,
}

impl<T> Filter<T> {
    /// Match every entity.
    pub fn all() -> Self {
        Self {
            condition: None,
            predicate: None,
        }
    }

    /// Match entities satisfying a store-side condition.
    pub fn condition(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            predicate: None,
        }
    }

    /// Match entities satisfying an in-memory predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            condition: None,
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Narrow this filter with an additional store-side condition.
    pub fn and_condition(self, condition: Condition) -> Self {
        let condition = match self.condition {
            Some(existing) => existing.and(condition),
            None => condition,
        };
        Self {
            condition: Some(condition),
            predicate: self.predicate,
        }
    }

    /// Narrow this filter with an additional in-memory predicate.
    pub fn and_predicate<F>(self, predicate: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = match self.predicate {
            Some(existing) => Arc::new(move |entity: &T| existing(entity) && predicate(entity)),
            None => Arc::new(predicate),
        };
        Self {
            condition: self.condition,
            predicate: Some(predicate),
        }
    }

    pub fn condition_ref(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    /// True when an in-memory predicate must run after the store query.
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// Evaluate the in-memory half of the filter.
    pub fn matches(&self, entity: &T) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(entity))
    }
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("condition", &self.condition)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Options for listing entities: filter, ordering, paging.
///
/// Without an ordering, results come back in key order. `skip` and `take`
/// apply after filtering and ordering.
pub struct ListQuery<T> {
    pub(crate) filter: Filter<T>,
    pub(crate) order_by: Option<Comparator<T>>,
    pub(crate) skip: Option<usize>,
    pub(crate) take: Option<usize>,
}

impl<T> ListQuery<T> {
    pub fn new() -> Self {
        Self {
            filter: Filter::all(),
            order_by: None,
            skip: None,
            take: None,
        }
    }

    pub fn filter(mut self, filter: Filter<T>) -> Self {
        self.filter = filter;
        self
    }

    /// Order results with a comparator. Sorting is stable.
    pub fn order_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.order_by = Some(Arc::new(compare));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// True when every part of the query can run inside the store.
    pub(crate) fn is_store_only(&self) -> bool {
        !self.filter.has_predicate() && self.order_by.is_none()
    }

    /// Apply predicate, ordering and paging to already-loaded rows.
    pub(crate) fn apply_in_memory(&self, rows: Vec<T>) -> Vec<T> {
        let mut rows: Vec<T> = rows.into_iter().filter(|e| self.filter.matches(e)).collect();
        if let Some(compare) = &self.order_by {
            rows.sort_by(|a, b| compare(a, b));
        }
        rows.into_iter()
            .skip(self.skip.unwrap_or(0))
            .take(self.take.unwrap_or(usize::MAX))
            .collect()
    }
}

impl<T> Default for ListQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Filter<T>> for ListQuery<T> {
    fn from(filter: Filter<T>) -> Self {
        Self::new().filter(filter)
    }
}

/// One `column = value` pair of a store-side bulk update.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: SqlValue,
}

impl Assignment {
    pub fn set(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(condition: &Condition) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        condition.write_sql(&mut sql, &mut params);
        (sql, params)
    }

    #[test]
    fn test_compare_renders_placeholder() {
        let (sql, params) = render(&Condition::ge("salary", 100.0));
        assert_eq!(sql, "salary >= ?");
        assert_eq!(params, vec![SqlValue::Real(100.0)]);
    }

    #[test]
    fn test_nested_conditions() {
        let condition = Condition::eq("married", true)
            .and(Condition::lt("salary", 10.0).or(Condition::is_null("name")))
            .not();
        let (sql, params) = render(&condition);
        assert_eq!(
            sql,
            "NOT ((married = ?) AND ((salary < ?) OR (name IS NULL)))"
        );
        assert_eq!(params, vec![SqlValue::Bool(true), SqlValue::Real(10.0)]);
    }

    #[test]
    fn test_in_list() {
        let (sql, params) = render(&Condition::is_in("phone", ["+12", "+13"]));
        assert_eq!(sql, "phone IN (?, ?)");
        assert_eq!(params.len(), 2);

        let empty: Vec<String> = Vec::new();
        let (sql, params) = render(&Condition::is_in("phone", empty));
        assert_eq!(sql, "0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let condition = Condition::eq("phone", "+12").and(Condition::eq("email", "x"));
        let err = condition.ensure_columns(&["phone", "name"]).unwrap_err();
        assert!(err.to_string().contains("email"));
        assert!(Condition::eq("name", "x").ensure_columns(&["name"]).is_ok());
    }

    #[test]
    fn test_filter_predicates_compose() {
        let filter = Filter::<i32>::predicate(|n| *n > 2).and_predicate(|n| n % 2 == 0);
        assert!(filter.matches(&4));
        assert!(!filter.matches(&3));
        assert!(!filter.matches(&2));
        assert!(Filter::<i32>::all().matches(&0));
    }

    #[test]
    fn test_list_query_in_memory() {
        let query = ListQuery::<i32>::new()
            .filter(Filter::predicate(|n| *n != 3))
            .order_by(|a, b| b.cmp(a))
            .skip(1)
            .take(2);
        assert!(!query.is_store_only());
        assert_eq!(query.apply_in_memory(vec![1, 2, 3, 4, 5]), vec![4, 2]);
    }

    #[test]
    fn test_optional_value_conversion() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("a")), SqlValue::Text("a".to_string()));
    }
}
