//! Generic SeaORM repository

use super::query::{build_select, QueryFluent};
use super::unit_of_work::Shared;
use crate::contract::{
    EntryId, FilterOptions, KeyOf, ObjectState, QueryObject, RepositoryApi,
    RepositoryError, Result,
};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, Condition, ConnectionTrait, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Related, Select, Statement, Value,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Repository for entity `E` bound to one unit of work.
///
/// Reads run inside the unit of work's transaction when one is open. Writes
/// are recorded in the unit of work and reach the database on
/// `save_changes`. Handles are cheap to clone; all clones share the same
/// unit of work.
pub struct Repository<E: EntityTrait> {
    shared: Weak<Shared>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> Repository<E> {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self {
            shared,
            _entity: PhantomData,
        }
    }

    fn shared(&self) -> Result<Arc<Shared>> {
        let shared = self.shared.upgrade().ok_or(RepositoryError::Disposed)?;
        shared.ensure_open()?;
        Ok(shared)
    }

    fn entity_name() -> &'static str {
        std::any::type_name::<E>()
    }
}

impl<E> Repository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    fn record(&self, state: ObjectState, model: E::ActiveModel) -> Result<EntryId> {
        self.shared()?.track(Self::entity_name(), state, model)
    }

    pub(crate) async fn count_matching(&self, options: FilterOptions<E>) -> Result<u64> {
        let shared = self.shared()?;
        let select = build_select(options)?;
        Ok(with_conn!(shared, |conn| select.count(conn).await?))
    }
}

impl<E: EntityTrait> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.shared.clone())
    }
}

impl<E: EntityTrait> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &Self::entity_name())
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

#[async_trait]
impl<E> RepositoryApi<E> for Repository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    async fn find(&self, key: KeyOf<E>) -> Result<Option<E::Model>> {
        let shared = self.shared()?;
        let select = E::find_by_id(key);
        Ok(with_conn!(shared, |conn| select.one(conn).await?))
    }

    async fn find_where(&self, condition: Condition) -> Result<Option<E::Model>> {
        let shared = self.shared()?;
        let select = E::find().filter(condition);
        Ok(with_conn!(shared, |conn| select.one(conn).await?))
    }

    async fn find_sorted(
        &self,
        column: E::Column,
        desc: bool,
        condition: Condition,
    ) -> Result<Option<E::Model>> {
        let shared = self.shared()?;
        let order = if desc { Order::Desc } else { Order::Asc };
        let select = E::find().filter(condition).order_by(column, order);
        Ok(with_conn!(shared, |conn| select.one(conn).await?))
    }

    async fn select_query(&self, sql: &str, values: Vec<Value>) -> Result<Vec<E::Model>> {
        let shared = self.shared()?;
        let stmt = Statement::from_sql_and_values(shared.db.get_database_backend(), sql, values);
        Ok(with_conn!(shared, |conn| E::find()
            .from_raw_sql(stmt)
            .all(conn)
            .await?))
    }

    fn insert(&self, model: E::ActiveModel) -> Result<EntryId> {
        self.record(ObjectState::Added, model)
    }

    fn insert_range(&self, models: Vec<E::ActiveModel>) -> Result<Vec<EntryId>> {
        models.into_iter().map(|model| self.insert(model)).collect()
    }

    fn update(&self, model: E::ActiveModel) -> Result<EntryId> {
        self.record(ObjectState::Modified, model)
    }

    fn delete(&self, model: E::ActiveModel) -> Result<EntryId> {
        self.record(ObjectState::Deleted, model)
    }

    async fn delete_by_id(&self, key: KeyOf<E>) -> Result<bool> {
        let Some(model) = self.find(key).await? else {
            return Ok(false);
        };
        self.delete(model.into_active_model())?;
        Ok(true)
    }

    async fn delete_and_save(&self, key: KeyOf<E>) -> Result<bool> {
        if !self.delete_by_id(key).await? {
            return Ok(false);
        }
        self.shared()?.save_changes().await?;
        Ok(true)
    }

    async fn filter(&self, options: FilterOptions<E>) -> Result<Vec<E::Model>> {
        let shared = self.shared()?;
        let select = build_select(options)?;
        Ok(with_conn!(shared, |conn| select.all(conn).await?))
    }

    async fn count(&self, condition: Condition) -> Result<u64> {
        self.count_matching(FilterOptions::new().filter(condition))
            .await
    }

    async fn all(&self) -> Result<Vec<E::Model>> {
        let shared = self.shared()?;
        Ok(with_conn!(shared, |conn| E::find().all(conn).await?))
    }

    fn get_all(&self) -> Select<E> {
        E::find()
    }

    fn queryable(&self) -> Select<E> {
        E::find()
    }

    fn query(&self) -> QueryFluent<E> {
        QueryFluent::new(self.clone(), FilterOptions::new())
    }

    fn query_with(&self, condition: Condition) -> QueryFluent<E> {
        QueryFluent::new(self.clone(), FilterOptions::new().filter(condition))
    }

    fn query_object(&self, query: &dyn QueryObject) -> QueryFluent<E> {
        self.query_with(query.query())
    }

    async fn find_with_related<R>(
        &self,
        condition: Condition,
    ) -> Result<Vec<(E::Model, Vec<R::Model>)>>
    where
        R: EntityTrait,
        E: Related<R>,
    {
        let shared = self.shared()?;
        let select = E::find()
            .filter(condition)
            .find_with_related(R::default());
        Ok(with_conn!(shared, |conn| select.all(conn).await?))
    }

    fn get_repository<T>(&self) -> Result<Repository<T>>
    where
        T: EntityTrait + 'static,
    {
        self.shared()?.repository::<T>()
    }
}
