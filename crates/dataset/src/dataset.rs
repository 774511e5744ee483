//! The `DataSet` contract exposed to views.

use crate::fetch::FetchMode;
use async_trait::async_trait;
use strata_core::{Entity, EntityState, Result};
use strata_query::EntityQuery;

/// A buffered entity store with remote synchronization.
///
/// The data set is the single mutable source of truth for its entities and
/// may be shared by several views; it performs no locking, so callers sharing
/// one data set must serialize mutating calls themselves. All methods take
/// `&self`: implementations use interior mutability.
///
/// Async methods are the store's completion signals. None of them retries,
/// cancels, or times out; transport policy belongs to the remote source.
#[async_trait(?Send)]
pub trait DataSet<T: Entity> {
    /// Returns the current buffered sequence. No side effect.
    fn all(&self) -> Vec<T>;

    /// Returns the change-tracking state of a buffered entity.
    fn state_of(&self, key: &T::Key) -> Option<EntityState>;

    /// Returns true when no refresh or sync is currently outstanding.
    fn is_synchronized(&self) -> bool;

    /// Repopulates the buffer from the remote source filtered by `query`.
    ///
    /// The completion carries the resulting page. Entities with buffered
    /// local changes are not overwritten.
    async fn refresh(&self, mode: FetchMode, query: &EntityQuery<T>) -> Result<Vec<T>>;

    /// Fetches and materializes a single entity by key, scoped by `query`.
    ///
    /// Fails if the key does not resolve.
    async fn load(&self, key: &T::Key, mode: FetchMode, query: &EntityQuery<T>) -> Result<T>;

    /// Reconciles the buffer with the remote source, scoped by `query`,
    /// without replacing the whole buffer.
    async fn sync(&self, query: &EntityQuery<T>) -> Result<()>;

    /// Adds an entity to the buffer.
    ///
    /// Whether the create is posted immediately or deferred to a batch
    /// commit is the store's buffering policy.
    async fn add(&self, entity: T) -> Result<()>;

    /// Replaces a buffered entity's value with an edit.
    async fn update(&self, entity: T) -> Result<()>;

    /// Marks an entity for deletion.
    async fn remove(&self, entity: &T) -> Result<()>;

    /// Pure local lookup. Returns `None` if the key is not buffered.
    fn find_by_key(&self, key: &T::Key) -> Option<T>;

    /// Persists a single entity's buffered change to the remote source.
    async fn save_entity(&self, entity: &T) -> Result<()>;

    /// Discards an entity's buffered changes and restores its last-known-good
    /// state. Never touches the remote source.
    fn reset_entity(&self, entity: &T) -> Result<()>;

    /// Low-level single-entity remote create. Used by the commit coordinator.
    async fn remote_create(&self, entity: &T) -> Result<()>;

    /// Low-level single-entity remote update. Used by the commit coordinator.
    async fn remote_update(&self, entity: &T) -> Result<()>;

    /// Low-level single-entity remote delete. Used by the commit coordinator.
    async fn remote_remove(&self, entity: &T) -> Result<()>;
}
