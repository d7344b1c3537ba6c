use crate::error::{RepositoryError, RepositoryResult, StoreFailure};
use crate::repositories::query::{Assignment, Filter, ListQuery, SqlValue};
use crate::repositories::transaction::TransactionScope;
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::sqlite::SqliteRow;

/// A record type that can be persisted by the generic repository.
///
/// Implementations describe their table layout and how to move between the
/// Rust value and a row. The key column must be listed in `COLUMNS`, and
/// `to_values` must return one value per column in the same order.
pub trait Entity: Clone + Send + Sync + Unpin + 'static {
    /// Table holding this entity
    const TABLE: &'static str;

    /// Primary key column
    const KEY: &'static str;

    /// Every persisted column, key included
    const COLUMNS: &'static [&'static str];

    /// The key value of this entity.
    fn key(&self) -> SqlValue;

    /// Column values in `COLUMNS` order.
    fn to_values(&self) -> Vec<SqlValue>;

    /// Decode an entity from a row selected with `COLUMNS`.
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Generic data access over one entity type.
///
/// Every operation returns a [`RepositoryResult`]. Store errors are logged by
/// the implementation and reported as the generic [`StoreFailure`] category
/// of the operation; invalid arguments are rejected before the store is
/// touched.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// List entities matching the query.
    async fn get_list(&self, query: ListQuery<T>) -> RepositoryResult<Vec<T>>;

    /// List entities matching the query, projected through `projector`.
    async fn get_list_as<P, F>(&self, query: ListQuery<T>, projector: F) -> RepositoryResult<Vec<P>>
    where
        P: Send + 'static,
        F: Fn(T) -> P + Send + 'static,
    {
        let entities = self.get_list(query).await?;
        Ok(entities.into_iter().map(projector).collect())
    }

    /// The first entity matching the filter in key order, if any.
    async fn get_single(&self, filter: Filter<T>) -> RepositoryResult<Option<T>>;

    /// The first matching entity, projected through `projector`.
    async fn get_single_as<P, F>(&self, filter: Filter<T>, projector: F) -> RepositoryResult<Option<P>>
    where
        P: Send + 'static,
        F: FnOnce(T) -> P + Send + 'static,
    {
        Ok(self.get_single(filter).await?.map(projector))
    }

    /// Insert one entity.
    async fn add(&self, entity: &T) -> RepositoryResult<()>;

    /// Insert entities in chunks of `batch_size` (the repository default
    /// when `None`). Each chunk commits on its own; a failing chunk is
    /// rolled back, earlier chunks stay committed.
    async fn add_batch(&self, entities: &[T], batch_size: Option<usize>) -> RepositoryResult<()>;

    /// Overwrite the non-key columns of the entity with the same key.
    async fn update(&self, entity: &T) -> RepositoryResult<()>;

    /// Load matching entities, apply `mutator` to each, persist them in
    /// chunks. Returns the number of entities updated.
    async fn update_matching<F>(
        &self,
        filter: Filter<T>,
        mutator: F,
        batch_size: Option<usize>,
    ) -> RepositoryResult<usize>
    where
        F: Fn(&mut T) + Send + Sync + 'static;

    /// Set columns on every matching row inside the store. Returns the
    /// number of rows changed.
    async fn update_where(
        &self,
        filter: Filter<T>,
        assignments: Vec<Assignment>,
    ) -> RepositoryResult<u64>;

    /// Delete the entity with the same key.
    async fn remove(&self, entity: &T) -> RepositoryResult<()>;

    /// Delete entities by key in chunks, with the same commit behaviour as
    /// [`Repository::add_batch`].
    async fn remove_batch(&self, entities: &[T], batch_size: Option<usize>) -> RepositoryResult<()>;

    /// Delete every matching row. Returns the number of rows deleted.
    async fn remove_where(&self, filter: Filter<T>) -> RepositoryResult<u64>;

    async fn exists(&self, filter: Filter<T>) -> RepositoryResult<bool>;

    async fn count(&self, filter: Filter<T>) -> RepositoryResult<u64>;

    /// Sum of `selector` over matching entities; 0 when nothing matches.
    async fn sum<F>(&self, filter: Filter<T>, selector: F) -> RepositoryResult<f64>
    where
        F: Fn(&T) -> f64 + Send + 'static,
    {
        let values = select_values(self, filter, selector, StoreFailure::Sum).await?;
        Ok(values.into_iter().sum())
    }

    /// Mean of `selector` over matching entities; `None` when nothing matches.
    async fn average<F>(&self, filter: Filter<T>, selector: F) -> RepositoryResult<Option<f64>>
    where
        F: Fn(&T) -> f64 + Send + 'static,
    {
        let values = select_values(self, filter, selector, StoreFailure::Average).await?;
        if values.is_empty() {
            return Ok(None);
        }
        let count = values.len() as f64;
        Ok(Some(values.into_iter().sum::<f64>() / count))
    }

    async fn max<F>(&self, filter: Filter<T>, selector: F) -> RepositoryResult<Option<f64>>
    where
        F: Fn(&T) -> f64 + Send + 'static,
    {
        let values = select_values(self, filter, selector, StoreFailure::Maximum).await?;
        Ok(values.into_iter().reduce(f64::max))
    }

    async fn min<F>(&self, filter: Filter<T>, selector: F) -> RepositoryResult<Option<f64>>
    where
        F: Fn(&T) -> f64 + Send + 'static,
    {
        let values = select_values(self, filter, selector, StoreFailure::Minimum).await?;
        Ok(values.into_iter().reduce(f64::min))
    }

    /// Run `operation` inside one store transaction.
    ///
    /// Commits when the operation returns `Ok`; otherwise rolls back and
    /// returns the operation's error unchanged. Operations signal a
    /// deliberate abort with [`RepositoryError::Aborted`]. The operation
    /// must only touch the store through the scope it is given.
    async fn execute_transaction<R, F>(&self, operation: F) -> RepositoryResult<R>
    where
        R: Send + 'static,
        F: for<'c> FnOnce(&'c mut TransactionScope<T>) -> BoxFuture<'c, RepositoryResult<R>>
            + Send
            + 'static;
}

/// Load matching entities and map them through `selector`, reporting store
/// failures under the aggregate's own category.
async fn select_values<T, R, F>(
    repository: &R,
    filter: Filter<T>,
    selector: F,
    failure: StoreFailure,
) -> RepositoryResult<Vec<f64>>
where
    T: Entity,
    R: Repository<T> + ?Sized,
    F: Fn(&T) -> f64 + Send,
{
    match repository.get_list(ListQuery::from(filter)).await {
        Ok(entities) => Ok(entities.iter().map(selector).collect()),
        Err(RepositoryError::Store(_)) => Err(RepositoryError::Store(failure)),
        Err(other) => Err(other),
    }
}
