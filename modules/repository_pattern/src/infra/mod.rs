//! SeaORM implementations of the repository and unit of work

/// Evaluate `$body` with `$conn` bound to the active transaction, or to the
/// pooled connection when no transaction is open.
macro_rules! with_conn {
    ($shared:expr, |$conn:ident| $body:expr) => {{
        let guard = $shared.transaction.lock().await;
        let out = match guard.as_ref() {
            Some($conn) => $body,
            None => {
                let $conn = &$shared.db;
                $body
            }
        };
        out
    }};
}

pub mod query;
pub mod repository;
pub mod tracker;
pub mod unit_of_work;

pub use query::QueryFluent;
pub use repository::Repository;
pub use tracker::EntryState;
pub use unit_of_work::UnitOfWork;
