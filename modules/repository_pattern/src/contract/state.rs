//! Caller-facing tracking state of an entity recorded by a unit of work

use std::fmt;

/// State of an entity as seen by repository callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectState {
    /// Persisted and not scheduled for any write
    #[default]
    Unchanged,
    /// Scheduled for insertion
    Added,
    /// Scheduled for update
    Modified,
    /// Scheduled for deletion
    Deleted,
}

impl ObjectState {
    /// Whether `save_changes` will issue a statement for this state
    pub fn is_pending(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Handle to an entry recorded in a unit of work's change log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
