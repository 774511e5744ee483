//! The `Entity` trait for keyed, buffer-able records.

use core::fmt;
use core::hash::Hash;

/// A record that can be buffered locally and synchronized with a remote
/// source.
///
/// Entities are opaque to the data layer apart from their key: filtering and
/// ordering are supplied by the caller through a query, and change tracking
/// works on whole values. Keys must be stable for the lifetime of the entity;
/// a key change makes the entity untrackable.
pub trait Entity: Clone {
    /// The key type identifying an entity within its data set.
    type Key: Eq + Hash + Clone + fmt::Debug;

    /// Returns the entity's key.
    fn key(&self) -> Self::Key;
}
