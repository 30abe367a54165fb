//! Repository and unit of work interfaces.
//!
//! Implementations live in `infra`. Every method that talks to the database
//! is async; writes only record state and are flushed by
//! [`UnitOfWorkApi::save_changes`].

use super::error::Result;
use super::query::{FilterOptions, QueryObject};
use super::state::EntryId;
use super::tx::{TxConfig, TxIsolationLevel};
use crate::infra::{QueryFluent, Repository};
use async_trait::async_trait;
use sea_orm::{Condition, EntityTrait, PrimaryKeyTrait, Related, Select, Value};

/// Primary key value of an entity
pub type KeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Generic repository over one SeaORM entity
#[async_trait]
pub trait RepositoryApi<E: EntityTrait>: Send + Sync {
    /// Find by primary key
    async fn find(&self, key: KeyOf<E>) -> Result<Option<E::Model>>;

    /// First row matching `condition`
    async fn find_where(&self, condition: Condition) -> Result<Option<E::Model>>;

    /// First row matching `condition` after ordering by `column`.
    ///
    /// `desc = true` sorts descending. Older ports of this interface sorted
    /// ascending when the flag was set; callers migrating from them must
    /// flip the argument.
    async fn find_sorted(
        &self,
        column: E::Column,
        desc: bool,
        condition: Condition,
    ) -> Result<Option<E::Model>>;

    /// Run raw SQL and map the rows into models
    async fn select_query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<E::Model>>;

    /// Schedule an insert
    fn insert(&self, model: E::ActiveModel) -> Result<EntryId>;

    /// Schedule an insert for each model, in order
    fn insert_range(&self, models: Vec<E::ActiveModel>) -> Result<Vec<EntryId>>;

    /// Schedule an update
    fn update(&self, model: E::ActiveModel) -> Result<EntryId>;

    /// Schedule a delete of the given instance
    fn delete(&self, model: E::ActiveModel) -> Result<EntryId>;

    /// Load by key and schedule a delete. `false` when no row has the key.
    async fn delete_by_id(&self, key: KeyOf<E>) -> Result<bool>;

    /// Load by key, schedule a delete and save the unit of work
    async fn delete_and_save(&self, key: KeyOf<E>) -> Result<bool>;

    /// Filtered, ordered and optionally paged query
    async fn filter(&self, options: FilterOptions<E>) -> Result<Vec<E::Model>>;

    /// Number of rows matching `condition`
    async fn count(&self, condition: Condition) -> Result<u64>;

    /// Every row
    async fn all(&self) -> Result<Vec<E::Model>>;

    /// Composable select over the whole table
    fn get_all(&self) -> Select<E>;

    /// Composable select over the whole table
    fn queryable(&self) -> Select<E>;

    /// Fluent query with no predicate
    fn query(&self) -> QueryFluent<E>;

    /// Fluent query starting from `condition`
    fn query_with(&self, condition: Condition) -> QueryFluent<E>;

    /// Fluent query starting from a query object
    fn query_object(&self, query: &dyn QueryObject) -> QueryFluent<E>;

    /// Rows matching `condition` with their related `R` rows loaded
    async fn find_with_related<R>(
        &self,
        condition: Condition,
    ) -> Result<Vec<(E::Model, Vec<R::Model>)>>
    where
        R: EntityTrait,
        E: Related<R>;

    /// Repository for another entity from the same unit of work
    fn get_repository<T>(&self) -> Result<Repository<T>>
    where
        T: EntityTrait + 'static;
}

/// Transaction boundary and repository registry
#[async_trait]
pub trait UnitOfWorkApi: Send + Sync {
    /// Flush every pending change, returning the number of affected rows
    async fn save_changes(&self) -> Result<u64>;

    /// Repository for `E`, created on first use
    fn repository<E>(&self) -> Result<Repository<E>>
    where
        E: EntityTrait + 'static;

    /// Open a transaction at `isolation`
    async fn begin_transaction(&self, isolation: TxIsolationLevel) -> Result<()>;

    /// Open a transaction with explicit isolation and access mode
    async fn begin_transaction_with(&self, config: TxConfig) -> Result<()>;

    /// Commit the active transaction
    async fn commit(&self) -> Result<bool>;

    /// Roll back the active transaction and drop pending changes
    async fn rollback(&self) -> Result<()>;

    /// Remap every tracked entry before a flush
    fn sync_objects_state_pre_commit(&self);

    /// Accept every tracked entry and detach it
    fn sync_objects_state_post_commit(&self);

    /// Remap one tracked entry; `false` if it is no longer tracked
    fn sync_object_state(&self, entry: EntryId) -> bool;

    /// Release the transaction and connection. Safe to call twice.
    async fn dispose(&self) -> Result<()>;
}
