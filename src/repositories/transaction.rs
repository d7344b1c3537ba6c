use crate::error::{RepositoryError, RepositoryResult, StoreFailure};
use crate::repositories::query::Filter;
use crate::repositories::statements::{
    check_filter, fetch_entities, fetch_exists, store_error, write_entity, EntityWrite, Paging,
};
use crate::repositories::traits::Entity;
use sqlx::{Sqlite, Transaction};
use std::marker::PhantomData;

/// Repository operations bound to one open store transaction.
///
/// Handed to the operation passed to
/// [`Repository::execute_transaction`](crate::repositories::Repository::execute_transaction).
/// Nothing done through the scope is visible outside it until the
/// operation returns `Ok` and the transaction commits.
pub struct TransactionScope<T: Entity> {
    tx: Transaction<'static, Sqlite>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> TransactionScope<T> {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self {
            tx,
            _entity: PhantomData,
        }
    }

    /// The first entity matching the filter in key order, if any.
    pub async fn get_single(&mut self, filter: Filter<T>) -> RepositoryResult<Option<T>> {
        check_filter(&filter)?;
        let paging = (!filter.has_predicate()).then_some(Paging {
            skip: None,
            take: Some(1),
        });
        let entities: Vec<T> = fetch_entities(&mut self.tx, filter.condition_ref(), paging)
            .await
            .map_err(|e| store_error::<T>("transaction get_single", StoreFailure::Retrieve, e))?;
        Ok(entities.into_iter().find(|entity| filter.matches(entity)))
    }

    pub async fn exists(&mut self, filter: Filter<T>) -> RepositoryResult<bool> {
        check_filter(&filter)?;
        if !filter.has_predicate() {
            return fetch_exists::<T>(&mut self.tx, filter.condition_ref())
                .await
                .map_err(|e| store_error::<T>("transaction exists", StoreFailure::Exists, e));
        }
        let entities: Vec<T> = fetch_entities(&mut self.tx, filter.condition_ref(), None)
            .await
            .map_err(|e| store_error::<T>("transaction exists", StoreFailure::Exists, e))?;
        Ok(entities.iter().any(|entity| filter.matches(entity)))
    }

    pub async fn add(&mut self, entity: &T) -> RepositoryResult<()> {
        write_entity(&mut self.tx, EntityWrite::Insert, entity)
            .await
            .map_err(|e| store_error::<T>("transaction add", StoreFailure::Add, e))?;
        Ok(())
    }

    pub async fn update(&mut self, entity: &T) -> RepositoryResult<()> {
        let affected = write_entity(&mut self.tx, EntityWrite::Update, entity)
            .await
            .map_err(|e| store_error::<T>("transaction update", StoreFailure::Update, e))?;
        require_row(affected, "transaction update", StoreFailure::Update)
    }

    pub async fn remove(&mut self, entity: &T) -> RepositoryResult<()> {
        let affected = write_entity(&mut self.tx, EntityWrite::Delete, entity)
            .await
            .map_err(|e| store_error::<T>("transaction remove", StoreFailure::Remove, e))?;
        require_row(affected, "transaction remove", StoreFailure::Remove)
    }

    pub(crate) async fn commit(self) -> RepositoryResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| store_error::<T>("commit", StoreFailure::Transaction, e))
    }

    pub(crate) async fn rollback(self) {
        if let Err(e) = self.tx.rollback().await {
            tracing::error!(table = T::TABLE, error = %e, "Rollback failed");
        }
    }
}

/// A keyed write that touched no row targets a missing entity.
pub(crate) fn require_row(
    affected: u64,
    operation: &'static str,
    failure: StoreFailure,
) -> RepositoryResult<()> {
    if affected == 0 {
        tracing::warn!(operation, "No row matched the entity key");
        return Err(RepositoryError::Store(failure));
    }
    Ok(())
}
