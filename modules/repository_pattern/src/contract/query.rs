//! Query inputs accepted by repositories

use sea_orm::sea_query::ConditionExpression;
use sea_orm::{Condition, EntityTrait, Order, RelationDef, RelationTrait};
use std::fmt;
use std::sync::Arc;

/// Builds the definition of a relation joined into a filtered query
pub type Include = Arc<dyn Fn() -> RelationDef + Send + Sync>;

/// Reusable predicate object
pub trait QueryObject: Send + Sync {
    /// Condition this object stands for
    fn query(&self) -> Condition;
}

/// Predicate built up from `and` / `or` steps.
///
/// An empty `Criteria` matches every row.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    condition: Option<Condition>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `expr` in addition to everything added so far
    #[must_use]
    pub fn and<C>(mut self, expr: C) -> Self
    where
        C: Into<ConditionExpression>,
    {
        self.condition = Some(match self.condition.take() {
            Some(current) => Condition::all().add(current).add(expr),
            None => Condition::all().add(expr),
        });
        self
    }

    /// Accept rows matching either everything so far or `expr`
    #[must_use]
    pub fn or<C>(mut self, expr: C) -> Self
    where
        C: Into<ConditionExpression>,
    {
        self.condition = Some(match self.condition.take() {
            Some(current) => Condition::any().add(current).add(expr),
            None => Condition::any().add(expr),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
    }
}

impl QueryObject for Criteria {
    fn query(&self) -> Condition {
        self.condition.clone().unwrap_or_else(Condition::all)
    }
}

impl From<Criteria> for Condition {
    fn from(criteria: Criteria) -> Self {
        criteria.condition.unwrap_or_else(Condition::all)
    }
}

/// Options for [`RepositoryApi::filter`](crate::RepositoryApi::filter).
///
/// Paging only applies when both `page` and `page_size` are set. Pages are
/// 1-based.
pub struct FilterOptions<E: EntityTrait> {
    /// Row predicate
    pub condition: Option<Condition>,
    /// Ordering, applied in sequence
    pub order_by: Vec<(E::Column, Order)>,
    /// Relations joined into the query so the predicate can reference
    /// their columns. Each root row is returned at most once.
    pub includes: Vec<Include>,
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Rows per page
    pub page_size: Option<u64>,
}

impl<E: EntityTrait> FilterOptions<E> {
    pub fn new() -> Self {
        Self {
            condition: None,
            order_by: Vec::new(),
            includes: Vec::new(),
            page: None,
            page_size: None,
        }
    }

    /// AND `condition` into the predicate
    #[must_use]
    pub fn filter(mut self, condition: impl Into<ConditionExpression>) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(current) => current.add(condition),
            None => Condition::all().add(condition),
        });
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: E::Column, order: Order) -> Self {
        self.order_by.push((column, order));
        self
    }

    #[must_use]
    pub fn include<R>(mut self, relation: R) -> Self
    where
        R: RelationTrait + Send + Sync + 'static,
    {
        self.includes.push(Arc::new(move || relation.def()));
        self
    }

    #[must_use]
    pub fn page(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// Drop paging and ordering, keeping predicate and includes
    pub(crate) fn without_paging(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            order_by: Vec::new(),
            includes: self.includes.clone(),
            page: None,
            page_size: None,
        }
    }
}

impl<E: EntityTrait> Default for FilterOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> Clone for FilterOptions<E> {
    fn clone(&self) -> Self {
        Self {
            condition: self.condition.clone(),
            order_by: self.order_by.clone(),
            includes: self.includes.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

impl<E: EntityTrait> fmt::Debug for FilterOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("condition", &self.condition)
            .field("order_by", &self.order_by)
            .field("includes", &self.includes.len())
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish()
    }
}
