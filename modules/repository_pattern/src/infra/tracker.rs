//! Pending-change log kept by a unit of work.
//!
//! SeaORM has no change tracker of its own: write operations are recorded
//! here as type-erased active models and flushed in recording order by
//! `save_changes`.

use crate::contract::{EntryId, ObjectState};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel,
};

/// State of a log entry as seen by the flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Recorded but not yet synchronised
    Detached,
    Unchanged,
    Added,
    Modified,
    Deleted,
}

impl From<ObjectState> for EntryState {
    fn from(state: ObjectState) -> Self {
        match state {
            ObjectState::Unchanged => Self::Unchanged,
            ObjectState::Added => Self::Added,
            ObjectState::Modified => Self::Modified,
            ObjectState::Deleted => Self::Deleted,
        }
    }
}

impl From<EntryState> for ObjectState {
    fn from(state: EntryState) -> Self {
        match state {
            EntryState::Detached | EntryState::Unchanged => Self::Unchanged,
            EntryState::Added => Self::Added,
            EntryState::Modified => Self::Modified,
            EntryState::Deleted => Self::Deleted,
        }
    }
}

/// A write waiting to be flushed
#[async_trait]
pub(crate) trait PendingChange: Send + Sync {
    /// Execute the statement for `state`, returning affected rows
    async fn apply(&self, state: EntryState, tx: &DatabaseTransaction) -> Result<u64, DbErr>;
}

pub(crate) struct ActiveModelChange<A> {
    model: A,
}

impl<A> ActiveModelChange<A> {
    pub(crate) fn new(model: A) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<A> PendingChange for ActiveModelChange<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    async fn apply(&self, state: EntryState, tx: &DatabaseTransaction) -> Result<u64, DbErr> {
        match state {
            EntryState::Added => {
                self.model.clone().insert(tx).await?;
                Ok(1)
            }
            EntryState::Modified => {
                self.model.clone().update(tx).await?;
                Ok(1)
            }
            EntryState::Deleted => Ok(self.model.clone().delete(tx).await?.rows_affected),
            EntryState::Detached | EntryState::Unchanged => Ok(0),
        }
    }
}

pub(crate) struct TrackedEntry {
    pub(crate) id: EntryId,
    pub(crate) entity: &'static str,
    pub(crate) object_state: ObjectState,
    pub(crate) state: EntryState,
    pub(crate) change: Box<dyn PendingChange>,
}

impl TrackedEntry {
    fn sync(&mut self) {
        self.state = EntryState::from(self.object_state);
    }

    /// Mark as persisted
    pub(crate) fn accept(&mut self) {
        self.object_state = ObjectState::Unchanged;
        self.state = EntryState::Unchanged;
    }
}

#[derive(Default)]
pub(crate) struct ChangeTracker {
    entries: Vec<TrackedEntry>,
    next_id: u64,
}

impl ChangeTracker {
    pub(crate) fn record(
        &mut self,
        entity: &'static str,
        object_state: ObjectState,
        change: Box<dyn PendingChange>,
    ) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(TrackedEntry {
            id,
            entity,
            object_state,
            state: EntryState::Detached,
            change,
        });
        id
    }

    /// Remap one entry; `false` if it is no longer tracked
    pub(crate) fn sync_entry(&mut self, id: EntryId) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.sync();
                true
            }
            None => false,
        }
    }

    pub(crate) fn sync_pre_commit(&mut self) {
        self.entries.iter_mut().for_each(TrackedEntry::sync);
    }

    /// Accept every entry and detach it from the log
    pub(crate) fn sync_post_commit(&mut self) -> usize {
        let detached = self.entries.len();
        self.entries.iter_mut().for_each(TrackedEntry::accept);
        self.entries.retain(|e| e.object_state.is_pending());
        detached
    }

    pub(crate) fn take(&mut self) -> Vec<TrackedEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Put entries back in front of anything recorded since they were taken
    pub(crate) fn restore(&mut self, mut entries: Vec<TrackedEntry>) {
        entries.append(&mut self.entries);
        self.entries = entries;
    }

    pub(crate) fn object_state(&self, id: EntryId) -> Option<ObjectState> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.object_state)
    }

    #[cfg(test)]
    pub(crate) fn entry_state(&self, id: EntryId) -> Option<EntryState> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.state)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl PendingChange for Noop {
        async fn apply(&self, _state: EntryState, _tx: &DatabaseTransaction) -> Result<u64, DbErr> {
            Ok(0)
        }
    }

    fn record(tracker: &mut ChangeTracker, state: ObjectState) -> EntryId {
        tracker.record("test", state, Box::new(Noop))
    }

    #[test]
    fn states_round_trip_between_enums() {
        for state in [
            ObjectState::Unchanged,
            ObjectState::Added,
            ObjectState::Modified,
            ObjectState::Deleted,
        ] {
            assert_eq!(ObjectState::from(EntryState::from(state)), state);
        }
        assert_eq!(ObjectState::from(EntryState::Detached), ObjectState::Unchanged);
    }

    #[test]
    fn recorded_entries_start_detached_until_synced() {
        let mut tracker = ChangeTracker::default();
        let id = record(&mut tracker, ObjectState::Added);

        assert_eq!(tracker.entry_state(id), Some(EntryState::Detached));
        assert!(tracker.sync_entry(id));
        assert_eq!(tracker.entry_state(id), Some(EntryState::Added));
        assert_eq!(tracker.object_state(id), Some(ObjectState::Added));
    }

    #[test]
    fn pre_commit_syncs_every_entry() {
        let mut tracker = ChangeTracker::default();
        let added = record(&mut tracker, ObjectState::Added);
        let deleted = record(&mut tracker, ObjectState::Deleted);

        tracker.sync_pre_commit();

        assert_eq!(tracker.entry_state(added), Some(EntryState::Added));
        assert_eq!(tracker.entry_state(deleted), Some(EntryState::Deleted));
    }

    #[test]
    fn post_commit_detaches_everything() {
        let mut tracker = ChangeTracker::default();
        let id = record(&mut tracker, ObjectState::Modified);
        record(&mut tracker, ObjectState::Added);

        assert_eq!(tracker.sync_post_commit(), 2);
        assert_eq!(tracker.len(), 0);
        assert!(tracker.object_state(id).is_none());
        assert!(!tracker.sync_entry(id));
    }

    #[test]
    fn restore_keeps_original_order() {
        let mut tracker = ChangeTracker::default();
        let first = record(&mut tracker, ObjectState::Added);
        let taken = tracker.take();
        let later = record(&mut tracker, ObjectState::Deleted);

        tracker.restore(taken);

        let ids: Vec<EntryId> = tracker.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, later]);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut tracker = ChangeTracker::default();
        let a = record(&mut tracker, ObjectState::Added);
        tracker.sync_post_commit();
        let b = record(&mut tracker, ObjectState::Added);
        assert_ne!(a, b);
    }
}
