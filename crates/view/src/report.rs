//! On-demand classification of buffered entities by change state.

use strata_core::{Entity, EntityState};
use strata_dataset::DataSet;

/// The entities of a data set partitioned into the four change states.
///
/// A report is a pure function of the data set at the instant it is taken;
/// it is never cached. The four buckets are disjoint and their union is the
/// buffered sequence.
#[derive(Clone, Debug, Default)]
pub struct ChangeReport<T> {
    /// Entities pending a remote create.
    pub added: Vec<T>,
    /// Entities pending a remote update.
    pub modified: Vec<T>,
    /// Entities pending a remote delete.
    pub removed: Vec<T>,
    /// Entities with nothing pending.
    pub unchanged: Vec<T>,
}

impl<T: Entity> ChangeReport<T> {
    /// Partitions the entities of `set` by their change-tracking state.
    ///
    /// Entities the set no longer reports a state for (possible when the set
    /// is mutated by another view mid-iteration) count as unchanged.
    pub fn classify<S: DataSet<T>>(set: &S) -> Self {
        let mut report = Self {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
            unchanged: Vec::new(),
        };

        for entity in set.all() {
            let state = set.state_of(&entity.key()).unwrap_or_default();
            match state {
                EntityState::Added => report.added.push(entity),
                EntityState::Modified => report.modified.push(entity),
                EntityState::Removed => report.removed.push(entity),
                EntityState::Unchanged => report.unchanged.push(entity),
            }
        }

        report
    }

    /// Returns the bucket for one state.
    pub fn bucket(&self, state: EntityState) -> &[T] {
        match state {
            EntityState::Added => &self.added,
            EntityState::Modified => &self.modified,
            EntityState::Removed => &self.removed,
            EntityState::Unchanged => &self.unchanged,
        }
    }

    /// Returns the number of entities with a pending remote operation.
    pub fn pending_len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_pristine(&self) -> bool {
        self.pending_len() == 0
    }

    /// Returns the total number of classified entities.
    pub fn len(&self) -> usize {
        self.pending_len() + self.unchanged.len()
    }

    /// Returns true if the report covers no entities at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
