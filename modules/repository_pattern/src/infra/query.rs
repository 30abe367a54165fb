//! Fluent queries over a repository

use super::repository::Repository;
use crate::contract::{FilterOptions, RepositoryApi, RepositoryError, Result};
use sea_orm::sea_query::{ConditionExpression, Expr, IntoColumnRef, SimpleExpr};
use sea_orm::{
    ActiveModelBehavior, ColumnTrait, EntityTrait, IntoActiveModel, Iterable, JoinType, Order,
    PrimaryKeyToColumn, QueryFilter, QueryOrder, QuerySelect, QueryTrait, RelationTrait, Select,
};

/// Turn filter options into a SeaORM select
pub(crate) fn build_select<E: EntityTrait>(options: FilterOptions<E>) -> Result<Select<E>> {
    let FilterOptions {
        condition,
        order_by,
        includes,
        page,
        page_size,
    } = options;

    let mut select = E::find();

    if includes.is_empty() {
        if let Some(condition) = condition {
            select = select.filter(condition);
        }
    } else {
        // The joins live in a key subquery so each root row appears once and
        // ordering stays on the root table
        let keys: Vec<E::Column> = E::PrimaryKey::iter().map(|key| key.into_column()).collect();

        let mut matching = E::find().select_only();
        for key in &keys {
            matching = matching.column(*key);
        }
        for include in &includes {
            matching = matching.join(JoinType::LeftJoin, include());
        }
        if let Some(condition) = condition {
            matching = matching.filter(condition);
        }
        let matching = matching.into_query();

        select = match keys.as_slice() {
            [key] => select.filter(key.in_subquery(matching)),
            _ => select.filter(
                Expr::tuple(keys.iter().map(|key| {
                    SimpleExpr::Column((E::default(), *key).into_column_ref())
                }))
                .in_subquery(matching),
            ),
        };
    }

    for (column, order) in order_by {
        select = select.order_by(column, order);
    }

    if let (Some(page), Some(page_size)) = (page, page_size) {
        if page == 0 || page_size == 0 {
            return Err(RepositoryError::InvalidPage { page, page_size });
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or(RepositoryError::InvalidPage { page, page_size })?;
        select = select.offset(offset).limit(page_size);
    }

    Ok(select)
}

/// Query builder returned by [`RepositoryApi::query`]
pub struct QueryFluent<E: EntityTrait> {
    repository: Repository<E>,
    options: FilterOptions<E>,
}

impl<E: EntityTrait> QueryFluent<E> {
    pub(crate) fn new(repository: Repository<E>, options: FilterOptions<E>) -> Self {
        Self {
            repository,
            options,
        }
    }

    #[must_use]
    pub fn filter(mut self, condition: impl Into<ConditionExpression>) -> Self {
        self.options = self.options.filter(condition);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: E::Column, order: Order) -> Self {
        self.options = self.options.order_by(column, order);
        self
    }

    #[must_use]
    pub fn order_by_asc(self, column: E::Column) -> Self {
        self.order_by(column, Order::Asc)
    }

    #[must_use]
    pub fn order_by_desc(self, column: E::Column) -> Self {
        self.order_by(column, Order::Desc)
    }

    #[must_use]
    pub fn include<R>(mut self, relation: R) -> Self
    where
        R: RelationTrait + Send + Sync + 'static,
    {
        self.options = self.options.include(relation);
        self
    }

    pub fn options(&self) -> &FilterOptions<E> {
        &self.options
    }
}

impl<E> QueryFluent<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelBehavior + Send + Sync + 'static,
{
    /// Every matching row
    pub async fn select(self) -> Result<Vec<E::Model>> {
        self.repository.filter(self.options).await
    }

    /// One page of matching rows plus the total number of matches
    pub async fn select_page(self, page: u64, page_size: u64) -> Result<(Vec<E::Model>, u64)> {
        let total = self
            .repository
            .count_matching(self.options.without_paging())
            .await?;
        let rows = self
            .repository
            .filter(self.options.page(page, page_size))
            .await?;
        Ok((rows, total))
    }

    /// First matching row
    pub async fn first(self) -> Result<Option<E::Model>> {
        let rows = self.repository.filter(self.options.page(1, 1)).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn count(self) -> Result<u64> {
        self.repository
            .count_matching(self.options.without_paging())
            .await
    }
}
