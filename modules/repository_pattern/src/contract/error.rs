//! Error types for repositories and units of work
//!
//! Database failures are forwarded unmodified. The remaining variants cover
//! misuse of the unit of work itself.

use sea_orm::DbErr;

/// Repository and unit of work errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Failure raised by SeaORM or the underlying driver
    #[error(transparent)]
    Db(#[from] DbErr),

    /// `commit` or `rollback` called without a running transaction
    #[error("no active transaction")]
    NoActiveTransaction,

    /// `begin_transaction` called while a transaction is already running
    #[error("a transaction is already active")]
    TransactionAlreadyActive,

    /// The owning unit of work was disposed or dropped
    #[error("unit of work has been disposed")]
    Disposed,

    /// Paging requested with a zero page or page size, or an offset past `u64`
    #[error("invalid page {page} with page size {page_size}: both must be at least 1 and the offset must fit in u64")]
    InvalidPage {
        /// Requested page (1-based)
        page: u64,
        /// Requested page size
        page_size: u64,
    },

    /// Configuration could not be loaded
    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for RepositoryError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RepositoryError>;
