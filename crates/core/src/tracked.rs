//! Change tracking for a single buffered entity.
//!
//! A `Tracked` record pairs the current entity value with the pristine
//! original captured on first modification and the `EntityState` tag. The
//! data set owns one `Tracked` per buffered entity; views and the commit
//! coordinator only ever see clones of the current value.

use crate::error::{Error, Result};
use crate::state::EntityState;

/// Outcome of resetting a tracked entity to its last-known-good state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The entity was restored; the record stays in the buffer.
    Restored,
    /// The entity was never confirmed remotely; the record must be discarded.
    Discard,
}

/// Outcome of confirming a tracked entity after a successful remote operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The record stays in the buffer as `Unchanged`.
    Retained,
    /// The remote delete succeeded; the record must be discarded.
    Discard,
}

/// A buffered entity together with its change-tracking state.
#[derive(Clone, Debug)]
pub struct Tracked<T> {
    current: T,
    original: Option<T>,
    state: EntityState,
}

impl<T: Clone> Tracked<T> {
    /// Wraps an entity confirmed by the remote source (`Unchanged`).
    pub fn new(entity: T) -> Self {
        Self {
            current: entity,
            original: None,
            state: EntityState::Unchanged,
        }
    }

    /// Wraps a locally created entity (`Added`).
    pub fn added(entity: T) -> Self {
        Self {
            current: entity,
            original: None,
            state: EntityState::Added,
        }
    }

    /// Returns the current entity value.
    #[inline]
    pub fn entity(&self) -> &T {
        &self.current
    }

    /// Returns the pristine original, if one was captured.
    #[inline]
    pub fn original(&self) -> Option<&T> {
        self.original.as_ref()
    }

    /// Returns the change-tracking state.
    #[inline]
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Replaces the entity value with a buffered edit.
    ///
    /// The first edit of an `Unchanged` entity captures the original so a
    /// later reset can restore it. Editing a `Removed` entity is illegal.
    pub fn update(&mut self, value: T) -> Result<()> {
        match self.state {
            EntityState::Unchanged => {
                self.original = Some(core::mem::replace(&mut self.current, value));
                self.state = EntityState::Modified;
                Ok(())
            }
            EntityState::Added | EntityState::Modified => {
                // The original (if any) stays pinned to the first edit.
                self.current = value;
                Ok(())
            }
            EntityState::Removed => Err(Error::invalid_transition(self.state, "update")),
        }
    }

    /// Marks the entity for deletion.
    pub fn remove(&mut self) -> Result<()> {
        match self.state {
            EntityState::Unchanged | EntityState::Added | EntityState::Modified => {
                self.state = EntityState::Removed;
                Ok(())
            }
            EntityState::Removed => Err(Error::invalid_transition(self.state, "remove")),
        }
    }

    /// Discards buffered changes and restores the last-known-good value.
    ///
    /// Never touches the remote source. An `Added` entity has no pristine
    /// value, so the caller is told to discard the record instead.
    pub fn reset(&mut self) -> ResetOutcome {
        if self.state == EntityState::Added {
            return ResetOutcome::Discard;
        }
        if let Some(original) = self.original.take() {
            self.current = original;
        }
        self.state = EntityState::Unchanged;
        ResetOutcome::Restored
    }

    /// Confirms the pending change after its remote operation succeeded.
    pub fn commit(&mut self) -> CommitOutcome {
        match self.state {
            EntityState::Removed => CommitOutcome::Discard,
            _ => {
                self.original = None;
                self.state = EntityState::Unchanged;
                CommitOutcome::Retained
            }
        }
    }

    /// Overwrites the record with a value confirmed by the remote source.
    ///
    /// Used when a refresh or load materializes server data into the buffer.
    pub fn confirm(&mut self, value: T) {
        self.current = value;
        self.original = None;
        self.state = EntityState::Unchanged;
    }
}
