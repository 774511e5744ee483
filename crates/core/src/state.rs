//! Pending-change classification for buffered entities.

use core::fmt;

/// Classification of an entity relative to the last state confirmed by the
/// remote source.
///
/// Every buffered entity is in exactly one of these four states. The state
/// decides which remote verb (if any) a batch commit issues for the entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityState {
    /// The entity matches the remote source; nothing is pending.
    #[default]
    Unchanged,
    /// The entity exists only locally; a remote create is pending.
    Added,
    /// The entity has buffered field edits; a remote update is pending.
    Modified,
    /// The entity is marked for deletion; a remote delete is pending.
    Removed,
}

impl EntityState {
    /// All states, in declaration order.
    pub const ALL: [EntityState; 4] = [
        EntityState::Unchanged,
        EntityState::Added,
        EntityState::Modified,
        EntityState::Removed,
    ];

    /// Returns true if a remote operation is pending for this state.
    #[inline]
    pub fn is_pending(self) -> bool {
        !matches!(self, EntityState::Unchanged)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityState::Unchanged => "unchanged",
            EntityState::Added => "added",
            EntityState::Modified => "modified",
            EntityState::Removed => "removed",
        };
        f.write_str(name)
    }
}
