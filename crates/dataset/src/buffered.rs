//! The reference `DataSet` implementation.

use crate::dataset::DataSet;
use crate::fetch::FetchMode;
use crate::remote::RemoteSource;
use async_trait::async_trait;
use core::cell::{Cell, RefCell};
use hashbrown::{HashMap, HashSet};
use strata_core::{CommitOutcome, Entity, EntityState, Error, ResetOutcome, Result, Tracked};
use strata_query::EntityQuery;
use tracing::{debug, trace};

/// A buffered entity store replaying its changes against a `RemoteSource`.
///
/// The buffer keeps entities in insertion order with a key index alongside.
/// Entities marked `Removed` stay buffered until their remote delete
/// succeeds, so change reports and batch commits can still see them.
///
/// With buffering disabled, `add`/`update`/`remove` perform the matching
/// remote verb immediately after the local transition.
pub struct BufferedDataSet<T: Entity, R: RemoteSource<T>> {
    remote: R,
    rows: RefCell<Vec<Tracked<T>>>,
    index: RefCell<HashMap<T::Key, usize>>,
    buffered: bool,
    in_flight: Cell<usize>,
}

/// Settles `is_synchronized` when a refresh or sync completes, on both the
/// success and the failure path.
struct FlightGuard<'a>(&'a Cell<usize>);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

impl<T: Entity, R: RemoteSource<T>> BufferedDataSet<T, R> {
    /// Creates a buffered store: mutations are deferred until saved.
    pub fn new(remote: R) -> Self {
        Self::with_buffering(remote, true)
    }

    /// Creates a store with an explicit buffering policy.
    pub fn with_buffering(remote: R, buffered: bool) -> Self {
        Self {
            remote,
            rows: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
            buffered,
            in_flight: Cell::new(0),
        }
    }

    /// Returns the remote source.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns whether mutations are buffered.
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Returns the number of buffered entities, removed ones included.
    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    fn begin_flight(&self) -> FlightGuard<'_> {
        self.in_flight.set(self.in_flight.get() + 1);
        FlightGuard(&self.in_flight)
    }

    fn position(&self, key: &T::Key) -> Option<usize> {
        self.index.borrow().get(key).copied()
    }

    fn insert_tracked(&self, tracked: Tracked<T>) {
        let key = tracked.entity().key();
        let mut rows = self.rows.borrow_mut();
        rows.push(tracked);
        self.index.borrow_mut().insert(key, rows.len() - 1);
    }

    fn discard(&self, key: &T::Key) {
        let mut index = self.index.borrow_mut();
        if let Some(pos) = index.remove(key) {
            let mut rows = self.rows.borrow_mut();
            rows.remove(pos);
            for (i, row) in rows.iter().enumerate().skip(pos) {
                index.insert(row.entity().key(), i);
            }
        }
    }

    /// Materializes a server-confirmed entity into the buffer.
    ///
    /// Buffered local edits win over refreshed data; only `Unchanged`
    /// entities are overwritten.
    fn absorb(&self, entity: T) {
        match self.position(&entity.key()) {
            Some(pos) => {
                let mut rows = self.rows.borrow_mut();
                if rows[pos].state() == EntityState::Unchanged {
                    rows[pos].confirm(entity);
                } else {
                    trace!("keeping local pending edit over refreshed value");
                }
            }
            None => self.insert_tracked(Tracked::new(entity)),
        }
    }

    fn current_of(&self, key: &T::Key) -> Result<T> {
        let pos = self.position(key).ok_or_else(|| Error::not_found(key))?;
        Ok(self.rows.borrow()[pos].entity().clone())
    }

    fn apply_commit(&self, key: &T::Key, confirmed: Option<T>) {
        let outcome = {
            let pos = match self.position(key) {
                Some(pos) => pos,
                None => return,
            };
            let mut rows = self.rows.borrow_mut();
            match confirmed {
                Some(value) => {
                    rows[pos].confirm(value);
                    CommitOutcome::Retained
                }
                None => rows[pos].commit(),
            }
        };
        if outcome == CommitOutcome::Discard {
            self.discard(key);
        }
    }
}

#[async_trait(?Send)]
impl<T: Entity, R: RemoteSource<T>> DataSet<T> for BufferedDataSet<T, R> {
    fn all(&self) -> Vec<T> {
        self.rows
            .borrow()
            .iter()
            .map(|t| t.entity().clone())
            .collect()
    }

    fn state_of(&self, key: &T::Key) -> Option<EntityState> {
        let pos = self.position(key)?;
        Some(self.rows.borrow()[pos].state())
    }

    fn is_synchronized(&self) -> bool {
        self.in_flight.get() == 0
    }

    async fn refresh(&self, mode: FetchMode, query: &EntityQuery<T>) -> Result<Vec<T>> {
        if mode == FetchMode::Local {
            return Ok(query.apply(&self.all(), true));
        }

        let _flight = self.begin_flight();
        let page = self.remote.fetch(query, true).await?;
        for entity in &page {
            self.absorb(entity.clone());
        }
        debug!(rows = page.len(), "refresh settled");
        Ok(page)
    }

    async fn load(&self, key: &T::Key, mode: FetchMode, query: &EntityQuery<T>) -> Result<T> {
        if mode == FetchMode::Local {
            if let Some(entity) = self.find_by_key(key) {
                return Ok(entity);
            }
        }

        let entity = self.remote.fetch_by_key(key, query).await?;
        self.absorb(entity.clone());
        Ok(entity)
    }

    async fn sync(&self, query: &EntityQuery<T>) -> Result<()> {
        let _flight = self.begin_flight();
        let scope = self.remote.fetch(query, false).await?;

        let seen: HashSet<T::Key> = scope.iter().map(Entity::key).collect();
        let absorbed = scope.len();
        for entity in scope {
            self.absorb(entity);
        }

        // Evict unchanged entities within the query scope that the remote no
        // longer returns.
        let stale: Vec<T::Key> = self
            .rows
            .borrow()
            .iter()
            .filter(|t| {
                t.state() == EntityState::Unchanged
                    && query.matches(t.entity())
                    && !seen.contains(&t.entity().key())
            })
            .map(|t| t.entity().key())
            .collect();
        for key in &stale {
            self.discard(key);
        }

        debug!(absorbed, evicted = stale.len(), "sync settled");
        Ok(())
    }

    async fn add(&self, entity: T) -> Result<()> {
        let key = entity.key();
        if self.position(&key).is_some() {
            return Err(Error::duplicate_key(&key));
        }

        let immediate = (!self.buffered).then(|| entity.clone());
        self.insert_tracked(Tracked::added(entity));
        if let Some(entity) = immediate {
            self.remote_create(&entity).await?;
        }
        Ok(())
    }

    async fn update(&self, entity: T) -> Result<()> {
        let key = entity.key();
        let immediate = (!self.buffered).then(|| entity.clone());
        {
            let pos = self.position(&key).ok_or_else(|| Error::not_found(&key))?;
            self.rows.borrow_mut()[pos].update(entity)?;
        }
        if let Some(entity) = immediate {
            self.remote_update(&entity).await?;
        }
        Ok(())
    }

    async fn remove(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        {
            let pos = self.position(&key).ok_or_else(|| Error::not_found(&key))?;
            self.rows.borrow_mut()[pos].remove()?;
        }
        if !self.buffered {
            self.remote_remove(entity).await?;
        }
        Ok(())
    }

    fn find_by_key(&self, key: &T::Key) -> Option<T> {
        let pos = self.position(key)?;
        Some(self.rows.borrow()[pos].entity().clone())
    }

    async fn save_entity(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        let state = self
            .state_of(&key)
            .ok_or_else(|| Error::not_found(&key))?;
        match state {
            EntityState::Unchanged => Ok(()),
            EntityState::Added => self.remote_create(entity).await,
            EntityState::Modified => self.remote_update(entity).await,
            EntityState::Removed => self.remote_remove(entity).await,
        }
    }

    fn reset_entity(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        let outcome = {
            let pos = self.position(&key).ok_or_else(|| Error::not_found(&key))?;
            self.rows.borrow_mut()[pos].reset()
        };
        if outcome == ResetOutcome::Discard {
            self.discard(&key);
        }
        Ok(())
    }

    async fn remote_create(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        let current = self.current_of(&key)?;
        let confirmed = self.remote.create(&current).await?;
        self.apply_commit(&key, Some(confirmed));
        Ok(())
    }

    async fn remote_update(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        let current = self.current_of(&key)?;
        let confirmed = self.remote.update(&current).await?;
        self.apply_commit(&key, Some(confirmed));
        Ok(())
    }

    async fn remote_remove(&self, entity: &T) -> Result<()> {
        let key = entity.key();
        let current = self.current_of(&key)?;
        self.remote.remove(&current).await?;
        self.apply_commit(&key, None);
        Ok(())
    }
}
