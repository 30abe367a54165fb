//! Public contract: interfaces, query inputs, states and errors

pub mod api;
pub mod error;
pub mod query;
pub mod state;
pub mod tx;

pub use api::{KeyOf, RepositoryApi, UnitOfWorkApi};
pub use error::{RepositoryError, Result};
pub use query::{Criteria, FilterOptions, Include, QueryObject};
pub use state::{EntryId, ObjectState};
pub use tx::{TxAccessMode, TxConfig, TxIsolationLevel};
