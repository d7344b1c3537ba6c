use crate::error::{RepositoryError, RepositoryResult, StoreFailure};
use crate::repositories::query::{Assignment, Condition, Filter, ListQuery, SqlValue};
use crate::repositories::statements::{
    check_filter, delete_where_sql, execute, fetch_count, fetch_entities, fetch_exists,
    store_error, update_where_sql, write_entity, EntityWrite, Paging,
};
use crate::repositories::traits::{Entity, Repository};
use crate::repositories::transaction::{require_row, TransactionScope};
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Sqlite, SqlitePool};
use std::marker::PhantomData;

/// Default number of entities written per batch transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Generic repository backed by a SQLite connection pool.
///
/// Cloning is cheap; clones share the pool.
pub struct SqliteRepository<T: Entity> {
    pool: SqlitePool,
    batch_size: usize,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for SqliteRepository<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            batch_size: self.batch_size,
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> SqliteRepository<T> {
    /// Create a repository with the default batch size.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
            _entity: PhantomData,
        }
    }

    /// Override the default batch size. Zero is rejected later, by the
    /// batch operations themselves.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn connection(
        &self,
        operation: &'static str,
        failure: StoreFailure,
    ) -> RepositoryResult<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| store_error::<T>(operation, failure, e))
    }

    fn resolve_batch_size(&self, batch_size: Option<usize>) -> RepositoryResult<usize> {
        match batch_size.unwrap_or(self.batch_size) {
            0 => Err(RepositoryError::invalid_argument(
                "batch_size",
                "must be greater than zero",
            )),
            size => Ok(size),
        }
    }

    /// Load every entity matching `filter`, predicate included.
    async fn load_matching(
        &self,
        filter: &Filter<T>,
        operation: &'static str,
        failure: StoreFailure,
    ) -> RepositoryResult<Vec<T>> {
        let mut conn = self.connection(operation, failure).await?;
        let entities: Vec<T> = fetch_entities(&mut conn, filter.condition_ref(), None)
            .await
            .map_err(|e| store_error::<T>(operation, failure, e))?;
        Ok(entities
            .into_iter()
            .filter(|entity| filter.matches(entity))
            .collect())
    }

    /// Run a set-based statement over the rows selected by `filter`.
    ///
    /// A store-only filter becomes the statement's `WHERE` clause. A filter
    /// with a predicate is resolved to the matching keys first; the keys are
    /// applied in chunks of the batch size, all inside one transaction, so
    /// the statement never exceeds the store's bound-parameter limit.
    async fn execute_filtered<S>(
        &self,
        filter: Filter<T>,
        statement: S,
        operation: &'static str,
        failure: StoreFailure,
    ) -> RepositoryResult<u64>
    where
        S: Fn(Option<&Condition>) -> (String, Vec<SqlValue>) + Send + Sync,
    {
        if !filter.has_predicate() {
            let (sql, params) = statement(filter.condition_ref());
            let mut conn = self.connection(operation, failure).await?;
            return execute(&mut conn, &sql, params)
                .await
                .map_err(|e| store_error::<T>(operation, failure, e));
        }

        let size = self.resolve_batch_size(None)?;
        let keys: Vec<SqlValue> = self
            .load_matching(&filter, operation, failure)
            .await?
            .iter()
            .map(|entity| entity.key())
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error::<T>(operation, failure, e))?;

        let mut affected = 0;
        for chunk in keys.chunks(size) {
            let condition = Condition::is_in(T::KEY, chunk.iter().cloned());
            let (sql, params) = statement(Some(&condition));
            match execute(&mut tx, &sql, params).await {
                Ok(rows) => affected += rows,
                Err(e) => {
                    let err = store_error::<T>(operation, failure, e);
                    if let Err(e) = tx.rollback().await {
                        tracing::error!(table = T::TABLE, operation, error = %e, "Rollback failed");
                    }
                    return Err(err);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| store_error::<T>(operation, failure, e))?;
        tracing::debug!(
            table = T::TABLE,
            operation,
            keys = keys.len(),
            rows = affected,
            "Applied keyed statement"
        );
        Ok(affected)
    }

    /// Apply `write` to `entities` chunk by chunk, one transaction per chunk.
    async fn write_in_chunks(
        &self,
        entities: &[T],
        batch_size: Option<usize>,
        write: EntityWrite,
        operation: &'static str,
        failure: StoreFailure,
    ) -> RepositoryResult<()> {
        let size = self.resolve_batch_size(batch_size)?;
        if entities.is_empty() {
            return Err(RepositoryError::invalid_argument(
                "entities",
                "must contain at least one entity",
            ));
        }

        for (index, chunk) in entities.chunks(size).enumerate() {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| store_error::<T>(operation, failure, e))?;

            if let Err(err) = write_chunk(&mut tx, chunk, write, operation, failure).await {
                if let Err(e) = tx.rollback().await {
                    tracing::error!(table = T::TABLE, operation, error = %e, "Rollback failed");
                }
                return Err(err);
            }

            tx.commit()
                .await
                .map_err(|e| store_error::<T>(operation, failure, e))?;

            tracing::debug!(
                table = T::TABLE,
                operation,
                chunk = index,
                rows = chunk.len(),
                "Committed batch"
            );
        }

        Ok(())
    }
}

/// Write one chunk on an open transaction. Keyed writes that match no row
/// fail the chunk.
async fn write_chunk<T: Entity>(
    conn: &mut SqliteConnection,
    chunk: &[T],
    write: EntityWrite,
    operation: &'static str,
    failure: StoreFailure,
) -> RepositoryResult<()> {
    for entity in chunk {
        let affected = write_entity(&mut *conn, write, entity)
            .await
            .map_err(|e| store_error::<T>(operation, failure, e))?;
        if write != EntityWrite::Insert {
            require_row(affected, operation, failure)?;
        }
    }
    Ok(())
}

#[async_trait]
impl<T: Entity> Repository<T> for SqliteRepository<T> {
    async fn get_list(&self, query: ListQuery<T>) -> RepositoryResult<Vec<T>> {
        check_filter(&query.filter)?;

        let store_only = query.is_store_only();
        let paging = (store_only && (query.skip.is_some() || query.take.is_some())).then_some(
            Paging {
                skip: query.skip,
                take: query.take,
            },
        );

        let mut conn = self.connection("get_list", StoreFailure::Retrieve).await?;
        let entities: Vec<T> = fetch_entities(&mut conn, query.filter.condition_ref(), paging)
            .await
            .map_err(|e| store_error::<T>("get_list", StoreFailure::Retrieve, e))?;

        if store_only {
            Ok(entities)
        } else {
            Ok(query.apply_in_memory(entities))
        }
    }

    async fn get_single(&self, filter: Filter<T>) -> RepositoryResult<Option<T>> {
        check_filter(&filter)?;
        if filter.has_predicate() {
            let matching = self
                .load_matching(&filter, "get_single", StoreFailure::Retrieve)
                .await?;
            return Ok(matching.into_iter().next());
        }

        let paging = Paging {
            skip: None,
            take: Some(1),
        };
        let mut conn = self.connection("get_single", StoreFailure::Retrieve).await?;
        let entities: Vec<T> = fetch_entities(&mut conn, filter.condition_ref(), Some(paging))
            .await
            .map_err(|e| store_error::<T>("get_single", StoreFailure::Retrieve, e))?;
        Ok(entities.into_iter().next())
    }

    async fn add(&self, entity: &T) -> RepositoryResult<()> {
        let mut conn = self.connection("add", StoreFailure::Add).await?;
        write_entity(&mut conn, EntityWrite::Insert, entity)
            .await
            .map_err(|e| store_error::<T>("add", StoreFailure::Add, e))?;
        Ok(())
    }

    async fn add_batch(&self, entities: &[T], batch_size: Option<usize>) -> RepositoryResult<()> {
        self.write_in_chunks(
            entities,
            batch_size,
            EntityWrite::Insert,
            "add_batch",
            StoreFailure::Add,
        )
        .await
    }

    async fn update(&self, entity: &T) -> RepositoryResult<()> {
        let mut conn = self.connection("update", StoreFailure::Update).await?;
        let affected = write_entity(&mut conn, EntityWrite::Update, entity)
            .await
            .map_err(|e| store_error::<T>("update", StoreFailure::Update, e))?;
        require_row(affected, "update", StoreFailure::Update)
    }

    async fn update_matching<F>(
        &self,
        filter: Filter<T>,
        mutator: F,
        batch_size: Option<usize>,
    ) -> RepositoryResult<usize>
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        check_filter(&filter)?;
        self.resolve_batch_size(batch_size)?;

        let mut entities = self
            .load_matching(&filter, "update_matching", StoreFailure::Update)
            .await?;
        if entities.is_empty() {
            return Ok(0);
        }

        for entity in entities.iter_mut() {
            let key = entity.key();
            mutator(entity);
            if entity.key() != key {
                return Err(RepositoryError::invalid_argument(
                    "mutator",
                    "must not change the key column",
                ));
            }
        }

        self.write_in_chunks(
            &entities,
            batch_size,
            EntityWrite::Update,
            "update_matching",
            StoreFailure::Update,
        )
        .await?;
        Ok(entities.len())
    }

    async fn update_where(
        &self,
        filter: Filter<T>,
        assignments: Vec<Assignment>,
    ) -> RepositoryResult<u64> {
        check_filter(&filter)?;
        if assignments.is_empty() {
            return Err(RepositoryError::invalid_argument(
                "assignments",
                "must set at least one column",
            ));
        }
        for assignment in &assignments {
            if assignment.column == T::KEY {
                return Err(RepositoryError::invalid_argument(
                    "assignments",
                    "the key column cannot be reassigned",
                ));
            }
            if !T::COLUMNS.contains(&assignment.column) {
                return Err(RepositoryError::invalid_argument(
                    "assignments",
                    format!("unknown column '{}'", assignment.column),
                ));
            }
        }

        let pairs: Vec<(&'static str, SqlValue)> = assignments
            .into_iter()
            .map(|assignment| (assignment.column, assignment.value))
            .collect();
        self.execute_filtered(
            filter,
            |condition| update_where_sql::<T>(&pairs, condition),
            "update_where",
            StoreFailure::Update,
        )
        .await
    }

    async fn remove(&self, entity: &T) -> RepositoryResult<()> {
        let mut conn = self.connection("remove", StoreFailure::Remove).await?;
        let affected = write_entity(&mut conn, EntityWrite::Delete, entity)
            .await
            .map_err(|e| store_error::<T>("remove", StoreFailure::Remove, e))?;
        require_row(affected, "remove", StoreFailure::Remove)
    }

    async fn remove_batch(&self, entities: &[T], batch_size: Option<usize>) -> RepositoryResult<()> {
        self.write_in_chunks(
            entities,
            batch_size,
            EntityWrite::Delete,
            "remove_batch",
            StoreFailure::Remove,
        )
        .await
    }

    async fn remove_where(&self, filter: Filter<T>) -> RepositoryResult<u64> {
        check_filter(&filter)?;
        self.execute_filtered(
            filter,
            |condition| delete_where_sql::<T>(condition),
            "remove_where",
            StoreFailure::Remove,
        )
        .await
    }

    async fn exists(&self, filter: Filter<T>) -> RepositoryResult<bool> {
        check_filter(&filter)?;
        if filter.has_predicate() {
            let matching = self
                .load_matching(&filter, "exists", StoreFailure::Exists)
                .await?;
            return Ok(!matching.is_empty());
        }

        let mut conn = self.connection("exists", StoreFailure::Exists).await?;
        fetch_exists::<T>(&mut conn, filter.condition_ref())
            .await
            .map_err(|e| store_error::<T>("exists", StoreFailure::Exists, e))
    }

    async fn count(&self, filter: Filter<T>) -> RepositoryResult<u64> {
        check_filter(&filter)?;
        if filter.has_predicate() {
            let matching = self
                .load_matching(&filter, "count", StoreFailure::Count)
                .await?;
            return Ok(matching.len() as u64);
        }

        let mut conn = self.connection("count", StoreFailure::Count).await?;
        fetch_count::<T>(&mut conn, filter.condition_ref())
            .await
            .map_err(|e| store_error::<T>("count", StoreFailure::Count, e))
    }

    async fn execute_transaction<R, F>(&self, operation: F) -> RepositoryResult<R>
    where
        R: Send + 'static,
        F: for<'c> FnOnce(&'c mut TransactionScope<T>) -> BoxFuture<'c, RepositoryResult<R>>
            + Send
            + 'static,
    {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_error::<T>("execute_transaction", StoreFailure::Transaction, e))?;
        let mut scope = TransactionScope::new(tx);

        let outcome = operation(&mut scope).await;
        match outcome {
            Ok(value) => {
                scope.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(table = T::TABLE, error = %err, "Transaction rolled back");
                scope.rollback().await;
                Err(err)
            }
        }
    }
}
