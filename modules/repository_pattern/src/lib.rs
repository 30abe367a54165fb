//! Repository Pattern
//!
//! Generic repository and unit of work facade over SeaORM. Repositories
//! expose find, filter and raw-query reads plus insert/update/delete writes;
//! the unit of work groups those writes behind `save_changes` and scopes them
//! in transactions. SQL generation, pooling and isolation are SeaORM's.

pub mod config;
pub mod contract;
pub mod infra;

pub use config::DatabaseConfig;
pub use contract::{
    Criteria, EntryId, FilterOptions, Include, KeyOf, ObjectState, QueryObject, RepositoryApi,
    RepositoryError, Result, TxAccessMode, TxConfig, TxIsolationLevel, UnitOfWorkApi,
};
pub use infra::{EntryState, QueryFluent, Repository, UnitOfWork};
