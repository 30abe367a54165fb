//! Transaction settings for a unit of work.
//!
//! These mirror SeaORM's transaction configuration so callers can request an
//! isolation level without naming driver types. Conversion happens when the
//! transaction is opened.

use sea_orm::{AccessMode, IsolationLevel};
use serde::{Deserialize, Serialize};

/// Transaction isolation level.
///
/// `Unspecified` leaves the choice to the database.
///
/// # Backend Notes
///
/// - **`PostgreSQL`**: supports all levels.
/// - **`SQLite`**: always serializable; SeaORM ignores the requested level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxIsolationLevel {
    /// Database default
    #[default]
    Unspecified,
    /// Allows dirty reads
    ReadUncommitted,
    /// Prevents dirty reads
    ReadCommitted,
    /// Prevents dirty and non-repeatable reads
    RepeatableRead,
    /// Full serialization of transactions
    Serializable,
}

impl TxIsolationLevel {
    /// SeaORM level to request, `None` for the database default
    pub fn to_sea_orm(self) -> Option<IsolationLevel> {
        match self {
            Self::Unspecified => None,
            Self::ReadUncommitted => Some(IsolationLevel::ReadUncommitted),
            Self::ReadCommitted => Some(IsolationLevel::ReadCommitted),
            Self::RepeatableRead => Some(IsolationLevel::RepeatableRead),
            Self::Serializable => Some(IsolationLevel::Serializable),
        }
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxAccessMode {
    /// Transaction will only read data
    ReadOnly,
    /// Transaction may read and write data
    #[default]
    ReadWrite,
}

impl From<TxAccessMode> for AccessMode {
    fn from(mode: TxAccessMode) -> Self {
        match mode {
            TxAccessMode::ReadOnly => AccessMode::ReadOnly,
            TxAccessMode::ReadWrite => AccessMode::ReadWrite,
        }
    }
}

/// Configuration used when a unit of work opens a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxConfig {
    /// Isolation level
    pub isolation: TxIsolationLevel,
    /// Access mode, `None` for the database default
    pub access_mode: Option<TxAccessMode>,
}

impl TxConfig {
    /// Configuration with the given isolation level and default access mode
    #[must_use]
    pub fn with_isolation(isolation: TxIsolationLevel) -> Self {
        Self {
            isolation,
            access_mode: None,
        }
    }

    /// Read-only transaction at the database default isolation
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            isolation: TxIsolationLevel::Unspecified,
            access_mode: Some(TxAccessMode::ReadOnly),
        }
    }
}

impl From<TxIsolationLevel> for TxConfig {
    fn from(isolation: TxIsolationLevel) -> Self {
        Self::with_isolation(isolation)
    }
}
