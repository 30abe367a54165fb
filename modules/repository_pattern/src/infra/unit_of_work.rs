//! SeaORM-backed unit of work

use super::repository::Repository;
use super::tracker::{ActiveModelChange, ChangeTracker, TrackedEntry};
use crate::config::DatabaseConfig;
use crate::contract::{
    EntryId, ObjectState, RepositoryError, Result, TxConfig, TxIsolationLevel, UnitOfWorkApi,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, IntoActiveModel, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Registry = HashMap<&'static str, Box<dyn Any + Send + Sync>>;

/// State shared between a unit of work and its repositories
pub(crate) struct Shared {
    pub(crate) db: DatabaseConnection,
    pub(crate) transaction: tokio::sync::Mutex<Option<DatabaseTransaction>>,
    tracker: Mutex<ChangeTracker>,
    repositories: Mutex<Registry>,
    disposed: AtomicBool,
}

impl Shared {
    fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            transaction: tokio::sync::Mutex::new(None),
            tracker: Mutex::new(ChangeTracker::default()),
            repositories: Mutex::new(HashMap::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(RepositoryError::Disposed);
        }
        Ok(())
    }

    /// Record a write and sync its state
    pub(crate) fn track<A>(
        &self,
        entity: &'static str,
        state: ObjectState,
        model: A,
    ) -> Result<EntryId>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.ensure_open()?;
        let mut tracker = self.tracker.lock();
        let id = tracker.record(entity, state, Box::new(ActiveModelChange::new(model)));
        tracker.sync_entry(id);
        tracing::trace!(entity, %id, %state, "change recorded");
        Ok(id)
    }

    pub(crate) fn repository<E>(self: &Arc<Self>) -> Result<Repository<E>>
    where
        E: EntityTrait + 'static,
    {
        self.ensure_open()?;
        let key = std::any::type_name::<E>();
        let mut registry = self.repositories.lock();

        if let Some(existing) = registry
            .get(key)
            .and_then(|repo| repo.downcast_ref::<Repository<E>>())
        {
            return Ok(existing.clone());
        }

        let repo = Repository::new(Arc::downgrade(self));
        registry.insert(key, Box::new(repo.clone()));
        tracing::debug!(entity = key, "repository created");
        Ok(repo)
    }

    pub(crate) async fn save_changes(&self) -> Result<u64> {
        self.ensure_open()?;

        let mut entries = {
            let mut tracker = self.tracker.lock();
            tracker.sync_pre_commit();
            tracker.take()
        };
        if entries.is_empty() {
            return Ok(0);
        }

        // Inside a caller's transaction the flush runs in a savepoint, so a
        // failed flush leaves nothing behind for the restored entries to repeat
        let guard = self.transaction.lock().await;
        let outcome = match guard.as_ref() {
            Some(tx) => flush_atomically(tx, &entries).await,
            None => flush_atomically(&self.db, &entries).await,
        };
        drop(guard);

        match outcome {
            Ok(affected) => {
                entries.iter_mut().for_each(TrackedEntry::accept);
                tracing::debug!(entries = entries.len(), affected, "changes saved");
                Ok(affected)
            }
            Err(err) => {
                tracing::warn!(entries = entries.len(), error = %err, "saving changes failed");
                self.tracker.lock().restore(entries);
                Err(err.into())
            }
        }
    }
}

async fn flush(entries: &[TrackedEntry], tx: &DatabaseTransaction) -> std::result::Result<u64, DbErr> {
    let mut affected = 0;
    for entry in entries {
        let rows = entry.change.apply(entry.state, tx).await?;
        tracing::trace!(entity = entry.entity, id = %entry.id, rows, "change applied");
        affected += rows;
    }
    Ok(affected)
}

/// Flush in a transaction begun on `conn`: a new transaction on the pool, a
/// savepoint on an open transaction
async fn flush_atomically<C: TransactionTrait>(
    conn: &C,
    entries: &[TrackedEntry],
) -> std::result::Result<u64, DbErr> {
    let tx = conn.begin().await?;
    match flush(entries, &tx).await {
        Ok(affected) => {
            tx.commit().await?;
            Ok(affected)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed save did not complete");
            }
            Err(err)
        }
    }
}

/// Unit of work over one SeaORM connection.
///
/// Owns the optional active transaction, the log of pending writes and one
/// repository per entity type. Dropping it rolls back any open transaction.
pub struct UnitOfWork {
    shared: Arc<Shared>,
    default_isolation: TxIsolationLevel,
    owns_connection: bool,
}

impl UnitOfWork {
    /// Wrap an existing connection. The connection is left open on dispose.
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            shared: Arc::new(Shared::new(db)),
            default_isolation: TxIsolationLevel::Unspecified,
            owns_connection: false,
        }
    }

    /// Connect using `config`. The connection is closed on dispose.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = Database::connect(config.connect_options()).await?;
        tracing::info!(
            backend = ?db.get_database_backend(),
            default_isolation = ?config.default_isolation,
            "unit of work connected"
        );
        Ok(Self {
            shared: Arc::new(Shared::new(db)),
            default_isolation: config.default_isolation,
            owns_connection: true,
        })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.shared.db
    }

    /// Open a transaction at the configured default isolation
    pub async fn begin(&self) -> Result<()> {
        self.begin_transaction(self.default_isolation).await
    }

    pub async fn has_active_transaction(&self) -> bool {
        self.shared.transaction.lock().await.is_some()
    }

    /// Number of writes waiting for `save_changes`
    pub fn pending_changes(&self) -> usize {
        self.shared.tracker.lock().len()
    }

    /// Caller-facing state of a tracked entry, `None` once it is detached
    pub fn entry_state(&self, entry: EntryId) -> Option<ObjectState> {
        self.shared.tracker.lock().object_state(entry)
    }

    /// Number of repositories created so far
    pub fn repository_count(&self) -> usize {
        self.shared.repositories.lock().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Apply pending migrations from `M`
    pub async fn migrate<M: MigratorTrait>(&self) -> Result<()> {
        self.shared.ensure_open()?;
        M::up(&self.shared.db, None).await?;
        tracing::info!("migrations completed");
        Ok(())
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("default_isolation", &self.default_isolation)
            .field("owns_connection", &self.owns_connection)
            .field("pending_changes", &self.pending_changes())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[async_trait]
impl UnitOfWorkApi for UnitOfWork {
    async fn save_changes(&self) -> Result<u64> {
        self.shared.save_changes().await
    }

    fn repository<E>(&self) -> Result<Repository<E>>
    where
        E: EntityTrait + 'static,
    {
        self.shared.repository::<E>()
    }

    async fn begin_transaction(&self, isolation: TxIsolationLevel) -> Result<()> {
        self.begin_transaction_with(TxConfig::with_isolation(isolation))
            .await
    }

    async fn begin_transaction_with(&self, config: TxConfig) -> Result<()> {
        self.shared.ensure_open()?;
        let mut guard = self.shared.transaction.lock().await;
        if guard.is_some() {
            return Err(RepositoryError::TransactionAlreadyActive);
        }

        let tx = self
            .shared
            .db
            .begin_with_config(
                config.isolation.to_sea_orm(),
                config.access_mode.map(Into::into),
            )
            .await?;
        *guard = Some(tx);
        tracing::debug!(isolation = ?config.isolation, access_mode = ?config.access_mode, "transaction started");
        Ok(())
    }

    async fn commit(&self) -> Result<bool> {
        self.shared.ensure_open()?;
        let tx = self
            .shared
            .transaction
            .lock()
            .await
            .take()
            .ok_or(RepositoryError::NoActiveTransaction)?;
        tx.commit().await?;
        tracing::debug!("transaction committed");
        Ok(true)
    }

    async fn rollback(&self) -> Result<()> {
        self.shared.ensure_open()?;
        let tx = self
            .shared
            .transaction
            .lock()
            .await
            .take()
            .ok_or(RepositoryError::NoActiveTransaction)?;
        tx.rollback().await?;
        self.sync_objects_state_post_commit();
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    fn sync_objects_state_pre_commit(&self) {
        self.shared.tracker.lock().sync_pre_commit();
    }

    fn sync_objects_state_post_commit(&self) {
        let detached = self.shared.tracker.lock().sync_post_commit();
        if detached > 0 {
            tracing::debug!(detached, "tracked entries detached");
        }
    }

    fn sync_object_state(&self, entry: EntryId) -> bool {
        self.shared.tracker.lock().sync_entry(entry)
    }

    async fn dispose(&self) -> Result<()> {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let open = self.shared.transaction.lock().await.take();
        if let Some(tx) = open {
            tracing::warn!("disposing unit of work with an open transaction, rolling back");
            tx.rollback().await?;
        }

        let discarded = self.shared.tracker.lock().take().len();
        if discarded > 0 {
            tracing::warn!(discarded, "pending changes discarded on dispose");
        }
        self.shared.repositories.lock().clear();

        if self.owns_connection {
            self.shared.db.clone().close().await?;
        }
        tracing::debug!("unit of work disposed");
        Ok(())
    }
}
