//! Remote transport for a buffered data set.
//!
//! `RemoteSource` is the seam between the data layer and the wire: a data set
//! replays its buffered creates/updates/deletes against one, and repopulates
//! its buffer from one. Wire format, authentication, timeout, and retry all
//! live behind this trait.

use async_trait::async_trait;
use core::cell::{Cell, RefCell};
use hashbrown::HashSet;
use strata_core::{Entity, Error, RemoteOp, Result};
use strata_query::EntityQuery;

/// A remote endpoint serving and accepting entities.
#[async_trait(?Send)]
pub trait RemoteSource<T: Entity> {
    /// Fetches the entities matching `query`.
    ///
    /// `respect_paging` mirrors the query evaluator: a refresh fetches one
    /// page, a sync fetches the full filtered scope.
    async fn fetch(&self, query: &EntityQuery<T>, respect_paging: bool) -> Result<Vec<T>>;

    /// Fetches a single entity by key, scoped by `query`. Fails with
    /// `Error::NotFound` if the key does not resolve.
    async fn fetch_by_key(&self, key: &T::Key, query: &EntityQuery<T>) -> Result<T>;

    /// Creates an entity. The completion carries the endpoint's echo of the
    /// stored value.
    async fn create(&self, entity: &T) -> Result<T>;

    /// Updates an entity. The completion carries the endpoint's echo.
    async fn update(&self, entity: &T) -> Result<T>;

    /// Deletes an entity.
    async fn remove(&self, entity: &T) -> Result<()>;
}

/// An in-process `RemoteSource` backed by a plain vector.
///
/// Serves as the transport for tests and for fully offline embeddings. Every
/// transport call is counted, and failures can be injected per key to
/// exercise partial-batch behavior.
pub struct MemoryRemote<T: Entity> {
    rows: RefCell<Vec<T>>,
    failing: RefCell<HashSet<T::Key>>,
    fail_fetch: Cell<bool>,
    calls: Cell<usize>,
}

impl<T: Entity> Default for MemoryRemote<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryRemote<T> {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            fail_fetch: Cell::new(false),
            calls: Cell::new(0),
        }
    }

    /// Creates a remote pre-populated with `rows`.
    pub fn with_rows(rows: Vec<T>) -> Self {
        let remote = Self::new();
        *remote.rows.borrow_mut() = rows;
        remote
    }

    /// Inserts or replaces a row by key, bypassing failure injection.
    pub fn put(&self, entity: T) {
        let key = entity.key();
        let mut rows = self.rows.borrow_mut();
        match rows.iter().position(|r| r.key() == key) {
            Some(pos) => rows[pos] = entity,
            None => rows.push(entity),
        }
    }

    /// Deletes a row by key, bypassing failure injection.
    pub fn delete(&self, key: &T::Key) {
        self.rows.borrow_mut().retain(|r| r.key() != *key);
    }

    /// Returns a snapshot of the stored rows.
    pub fn rows(&self) -> Vec<T> {
        self.rows.borrow().clone()
    }

    /// Makes every create/update/remove/fetch-by-key for `key` fail.
    pub fn fail_key(&self, key: T::Key) {
        self.failing.borrow_mut().insert(key);
    }

    /// Clears failure injection for `key`.
    pub fn heal_key(&self, key: &T::Key) {
        self.failing.borrow_mut().remove(key);
    }

    /// Makes every `fetch` fail until cleared.
    pub fn set_fetch_failure(&self, fail: bool) {
        self.fail_fetch.set(fail);
    }

    /// Returns the number of transport calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    fn record_call(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn check_key(&self, key: &T::Key, op: RemoteOp) -> Result<()> {
        if self.failing.borrow().contains(key) {
            Err(Error::remote(op, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl<T: Entity> RemoteSource<T> for MemoryRemote<T> {
    async fn fetch(&self, query: &EntityQuery<T>, respect_paging: bool) -> Result<Vec<T>> {
        self.record_call();
        if self.fail_fetch.get() {
            return Err(Error::remote(RemoteOp::Fetch, "injected failure"));
        }
        Ok(query.apply(&self.rows.borrow(), respect_paging))
    }

    async fn fetch_by_key(&self, key: &T::Key, _query: &EntityQuery<T>) -> Result<T> {
        self.record_call();
        self.check_key(key, RemoteOp::Fetch)?;
        self.rows
            .borrow()
            .iter()
            .find(|r| r.key() == *key)
            .cloned()
            .ok_or_else(|| Error::not_found(key))
    }

    async fn create(&self, entity: &T) -> Result<T> {
        self.record_call();
        let key = entity.key();
        self.check_key(&key, RemoteOp::Create)?;
        let mut rows = self.rows.borrow_mut();
        if rows.iter().any(|r| r.key() == key) {
            return Err(Error::remote(RemoteOp::Create, "key already exists"));
        }
        rows.push(entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &T) -> Result<T> {
        self.record_call();
        let key = entity.key();
        self.check_key(&key, RemoteOp::Update)?;
        let mut rows = self.rows.borrow_mut();
        match rows.iter().position(|r| r.key() == key) {
            Some(pos) => {
                rows[pos] = entity.clone();
                Ok(entity.clone())
            }
            None => Err(Error::remote(RemoteOp::Update, "no such entity")),
        }
    }

    async fn remove(&self, entity: &T) -> Result<()> {
        self.record_call();
        let key = entity.key();
        self.check_key(&key, RemoteOp::Remove)?;
        let mut rows = self.rows.borrow_mut();
        match rows.iter().position(|r| r.key() == key) {
            Some(pos) => {
                rows.remove(pos);
                Ok(())
            }
            None => Err(Error::remote(RemoteOp::Remove, "no such entity")),
        }
    }
}
