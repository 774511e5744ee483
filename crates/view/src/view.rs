//! The `DataView` composition of a data set and a query.

use crate::commit;
use crate::observers::{ObserverId, ViewObservers};
use crate::report::ChangeReport;
use std::cell::RefCell;
use std::rc::Rc;
use strata_core::{Entity, Result};
use strata_dataset::{DataSet, FetchMode};
use strata_query::EntityQuery;
use tracing::{debug, trace};

/// A reactive, cached, change-aware projection of one data set through one
/// query.
///
/// A view binds to exactly one data set for its lifetime; the query is owned
/// by the view and reconfigured in place through `query()`. Several views may
/// share one data set (each with its own query and cache); the data set is
/// the single source of truth and mutations through any view are immediately
/// visible to all.
///
/// Reads flow data set → query → cached projection. Writes flow through the
/// data set's buffered mutations and are replayed remotely by
/// `save_changes`.
pub struct DataView<T: Entity, S: DataSet<T>> {
    set: Rc<S>,
    query: Rc<EntityQuery<T>>,
    cache: RefCell<Vec<T>>,
    retained_page: RefCell<Vec<T>>,
    observers: RefCell<ViewObservers<T>>,
}

impl<T, S> DataView<T, S>
where
    T: Entity + PartialEq + 'static,
    S: DataSet<T>,
{
    /// Creates a view over `set` with a default-constructed query.
    pub fn new(set: Rc<S>) -> Self {
        Self::with_query(set, Rc::new(EntityQuery::new()))
    }

    /// Creates a view over `set` bound to a caller-supplied query.
    pub fn with_query(set: Rc<S>, query: Rc<EntityQuery<T>>) -> Self {
        Self {
            set,
            query,
            cache: RefCell::new(Vec::new()),
            retained_page: RefCell::new(Vec::new()),
            observers: RefCell::new(ViewObservers::new()),
        }
    }

    /// Returns the bound query for reconfiguration.
    pub fn query(&self) -> &EntityQuery<T> {
        &self.query
    }

    /// Returns the underlying data set.
    pub fn data_set(&self) -> &S {
        &self.set
    }

    /// Returns the current projection, recomputing only when necessary.
    ///
    /// While paging is active, the data set is mid-synchronization, and a
    /// non-empty previous page exists, the previous page is served verbatim;
    /// recomputation is suppressed under exactly that condition. Observers
    /// are notified only when the recomputed sequence is element-wise
    /// different from the cached one.
    pub fn projection(&self) -> Vec<T> {
        if self.query.page_size() > 0 && !self.set.is_synchronized() {
            let retained = self.retained_page.borrow();
            if !retained.is_empty() {
                trace!("serving retained page while resynchronizing");
                return retained.clone();
            }
        }

        let fresh = self.query.apply(&self.set.all(), true);
        let changed = *self.cache.borrow() != fresh;
        if changed {
            *self.cache.borrow_mut() = fresh.clone();
            // Snapshot first: a callback may observe or forget reentrantly.
            let callbacks = self.observers.borrow().callbacks();
            for callback in callbacks {
                callback(&fresh);
            }
        }
        fresh
    }

    /// Returns the most recent page delivered by a refresh.
    pub fn last_result(&self) -> Vec<T> {
        self.retained_page.borrow().clone()
    }

    /// Registers an observer of projection changes.
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&[T]) + 'static,
    {
        self.observers.borrow_mut().observe(callback)
    }

    /// Removes an observer. Returns true if it was registered.
    pub fn forget(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().forget(id)
    }

    /// Refreshes the view from the remote source.
    ///
    /// When paging is active, the returned page is retained so the read path
    /// can serve it while the next resynchronization is in flight.
    pub async fn refresh(&self, mode: FetchMode) -> Result<Vec<T>> {
        let page = self.set.refresh(mode, &self.query).await?;
        if self.query.page_size() > 0 {
            *self.retained_page.borrow_mut() = page.clone();
        }
        debug!(rows = page.len(), "view refreshed");
        Ok(page)
    }

    /// Loads a single entity by key, scoped by the view's query.
    pub async fn load(&self, key: &T::Key, mode: FetchMode) -> Result<T> {
        self.set.load(key, mode, &self.query).await
    }

    /// Reconciles the data set with the remote source, scoped by the view's
    /// query.
    pub async fn sync(&self) -> Result<()> {
        self.set.sync(&self.query).await
    }

    /// Adds an entity through the data set's buffered mutation.
    pub async fn add(&self, entity: T) -> Result<()> {
        self.set.add(entity).await
    }

    /// Updates an entity through the data set's buffered mutation.
    pub async fn update(&self, entity: T) -> Result<()> {
        self.set.update(entity).await
    }

    /// Removes an entity through the data set's buffered mutation.
    pub async fn remove(&self, entity: &T) -> Result<()> {
        self.set.remove(entity).await
    }

    /// Pure local lookup against the data set.
    pub fn find_by_key(&self, key: &T::Key) -> Option<T> {
        self.set.find_by_key(key)
    }

    /// Persists a single entity's buffered change.
    pub async fn save_entity(&self, entity: &T) -> Result<()> {
        self.set.save_entity(entity).await
    }

    /// Discards an entity's buffered changes locally.
    pub fn reset_entity(&self, entity: &T) -> Result<()> {
        self.set.reset_entity(entity)
    }

    /// Classifies the data set's entities by change state. Never cached.
    pub fn changes(&self) -> ChangeReport<T> {
        ChangeReport::classify(&*self.set)
    }

    /// Commits all pending creates, updates, and deletes as one joined batch.
    ///
    /// See the crate docs for the partial-failure contract.
    pub async fn save_changes(&self) -> Result<()> {
        let report = self.changes();
        commit::commit_all(&*self.set, &report).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::task::noop_waker;
    use std::future::Future;
    use std::task::{Context, Poll};
    use strata_core::{EntityState, Error};
    use strata_dataset::{BufferedDataSet, MemoryRemote, RemoteSource};

    #[derive(Clone, Debug, PartialEq)]
    struct Task {
        id: i64,
        title: &'static str,
    }

    impl Entity for Task {
        type Key = i64;
        fn key(&self) -> i64 {
            self.id
        }
    }

    fn task(id: i64, title: &'static str) -> Task {
        Task { id, title }
    }

    type TestSet = BufferedDataSet<Task, MemoryRemote<Task>>;

    fn seeded_view() -> DataView<Task, TestSet> {
        let remote =
            MemoryRemote::with_rows(vec![task(1, "one"), task(2, "two"), task(3, "three")]);
        let view = DataView::new(Rc::new(BufferedDataSet::new(remote)));
        block_on(view.refresh(FetchMode::Remote)).unwrap();
        view
    }

    /// A transport whose next fetch stalls until a oneshot fires, keeping the
    /// data set unsynchronized in the meantime.
    struct GatedRemote {
        inner: MemoryRemote<Task>,
        gate: RefCell<Option<oneshot::Receiver<()>>>,
    }

    impl GatedRemote {
        fn new(rows: Vec<Task>) -> Self {
            Self {
                inner: MemoryRemote::with_rows(rows),
                gate: RefCell::new(None),
            }
        }

        fn hold_next_fetch(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            *self.gate.borrow_mut() = Some(rx);
            tx
        }
    }

    #[async_trait(?Send)]
    impl RemoteSource<Task> for GatedRemote {
        async fn fetch(&self, query: &EntityQuery<Task>, respect_paging: bool) -> Result<Vec<Task>> {
            let gate = self.gate.borrow_mut().take();
            if let Some(rx) = gate {
                let _ = rx.await;
            }
            self.inner.fetch(query, respect_paging).await
        }

        async fn fetch_by_key(&self, key: &i64, query: &EntityQuery<Task>) -> Result<Task> {
            self.inner.fetch_by_key(key, query).await
        }

        async fn create(&self, entity: &Task) -> Result<Task> {
            self.inner.create(entity).await
        }

        async fn update(&self, entity: &Task) -> Result<Task> {
            self.inner.update(entity).await
        }

        async fn remove(&self, entity: &Task) -> Result<()> {
            self.inner.remove(entity).await
        }
    }

    fn poll_once<F: Future>(future: &mut std::pin::Pin<&mut F>) -> Poll<F::Output> {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        future.as_mut().poll(&mut cx)
    }

    #[test]
    fn test_unpaged_projection_matches_fresh_apply() {
        let view = seeded_view();
        view.query().filter(|t: &Task| t.id != 2);

        let expected = view.query().apply(&view.data_set().all(), true);
        assert_eq!(view.projection(), expected);
    }

    #[test]
    fn test_projection_reflects_buffered_mutations() {
        let view = seeded_view();
        assert_eq!(view.projection().len(), 3);

        block_on(view.add(task(4, "four"))).unwrap();
        assert_eq!(view.projection().len(), 4);

        block_on(view.update(task(1, "edited"))).unwrap();
        assert_eq!(view.projection()[0].title, "edited");
    }

    #[test]
    fn test_observers_fire_only_on_structural_change() {
        let view = seeded_view();

        let emissions = Rc::new(RefCell::new(0));
        let sink = emissions.clone();
        view.observe(move |_| *sink.borrow_mut() += 1);

        view.projection();
        assert_eq!(*emissions.borrow(), 1);

        // Identical recomputation: no churn.
        view.projection();
        view.projection();
        assert_eq!(*emissions.borrow(), 1);

        block_on(view.update(task(1, "edited"))).unwrap();
        view.projection();
        assert_eq!(*emissions.borrow(), 2);
    }

    #[test]
    fn test_observer_can_forget_itself_during_notification() {
        let view = Rc::new(seeded_view());

        let emissions = Rc::new(RefCell::new(0));
        let handle: Rc<RefCell<Option<ObserverId>>> = Rc::new(RefCell::new(None));

        let sink = emissions.clone();
        let own_id = handle.clone();
        let registry = view.clone();
        let id = view.observe(move |_| {
            *sink.borrow_mut() += 1;
            if let Some(id) = own_id.borrow_mut().take() {
                registry.forget(id);
            }
        });
        *handle.borrow_mut() = Some(id);

        view.projection();
        assert_eq!(*emissions.borrow(), 1);

        // Removed itself mid-notification; later changes stay silent.
        block_on(view.update(task(1, "edited"))).unwrap();
        view.projection();
        assert_eq!(*emissions.borrow(), 1);
    }

    #[test]
    fn test_observer_can_register_another_during_notification() {
        let view = Rc::new(seeded_view());

        let late_emissions = Rc::new(RefCell::new(0));
        let registered = Rc::new(RefCell::new(false));

        let sink = late_emissions.clone();
        let once = registered.clone();
        let registry = view.clone();
        view.observe(move |_| {
            if !core::mem::replace(&mut *once.borrow_mut(), true) {
                let sink = sink.clone();
                registry.observe(move |_| *sink.borrow_mut() += 1);
            }
        });

        // The late observer misses the emission that registered it.
        view.projection();
        assert_eq!(*late_emissions.borrow(), 0);

        block_on(view.update(task(1, "edited"))).unwrap();
        view.projection();
        assert_eq!(*late_emissions.borrow(), 1);
    }

    #[test]
    fn test_forget_stops_notifications() {
        let view = seeded_view();

        let emissions = Rc::new(RefCell::new(0));
        let sink = emissions.clone();
        let id = view.observe(move |_| *sink.borrow_mut() += 1);
        assert!(view.forget(id));

        view.projection();
        assert_eq!(*emissions.borrow(), 0);
    }

    #[test]
    fn test_refresh_retains_page_only_when_paging() {
        let view = seeded_view();
        assert!(view.last_result().is_empty());

        view.query().set_page_size(2);
        block_on(view.refresh(FetchMode::Remote)).unwrap();
        assert_eq!(view.last_result().len(), 2);
    }

    #[test]
    fn test_paged_projection_served_verbatim_while_resynchronizing() {
        let remote = GatedRemote::new(vec![task(1, "one"), task(2, "two"), task(3, "three")]);
        let set = Rc::new(BufferedDataSet::new(remote));
        let view: DataView<Task, BufferedDataSet<Task, GatedRemote>> = DataView::new(set);

        view.query().set_page_size(2);
        let first_page = block_on(view.refresh(FetchMode::Remote)).unwrap();
        assert_eq!(view.projection(), first_page);

        // A buffered edit lands while the second refresh is in flight.
        let gate = view.data_set().remote().hold_next_fetch();
        let refresh = view.refresh(FetchMode::Remote);
        futures::pin_mut!(refresh);
        assert!(poll_once(&mut refresh).is_pending());
        assert!(!view.data_set().is_synchronized());

        block_on(view.update(task(1, "edited"))).unwrap();

        // Stale page, byte for byte.
        assert_eq!(view.projection(), first_page);

        gate.send(()).unwrap();
        block_on(refresh).unwrap();

        assert!(view.data_set().is_synchronized());
        assert_eq!(view.projection()[0].title, "edited");
    }

    #[test]
    fn test_empty_retained_page_never_suppresses() {
        let remote = GatedRemote::new(vec![task(1, "one")]);
        let set = Rc::new(BufferedDataSet::new(remote));
        let view: DataView<Task, BufferedDataSet<Task, GatedRemote>> = DataView::new(set);
        view.query().set_page_size(2);

        block_on(view.add(task(9, "local"))).unwrap();

        // No page was ever retained, so a mid-flight sync must not blank the
        // projection.
        let gate = view.data_set().remote().hold_next_fetch();
        let sync = view.sync();
        futures::pin_mut!(sync);
        assert!(poll_once(&mut sync).is_pending());

        assert_eq!(view.projection().len(), 1);

        gate.send(()).unwrap();
        block_on(sync).unwrap();
    }

    #[test]
    fn test_unpaged_projection_never_serves_stale() {
        let remote = GatedRemote::new(vec![task(1, "one"), task(2, "two")]);
        let set = Rc::new(BufferedDataSet::new(remote));
        let view: DataView<Task, BufferedDataSet<Task, GatedRemote>> = DataView::new(set);

        block_on(view.refresh(FetchMode::Remote)).unwrap();
        view.projection();

        let gate = view.data_set().remote().hold_next_fetch();
        let refresh = view.refresh(FetchMode::Remote);
        futures::pin_mut!(refresh);
        assert!(poll_once(&mut refresh).is_pending());

        block_on(view.update(task(1, "edited"))).unwrap();
        // Unpaged: always recomputed, even mid-flight.
        assert_eq!(view.projection()[0].title, "edited");

        gate.send(()).unwrap();
        block_on(refresh).unwrap();
    }

    #[test]
    fn test_save_changes_empty_report_makes_no_remote_calls() {
        let view = seeded_view();
        let calls = view.data_set().remote().call_count();

        block_on(view.save_changes()).unwrap();
        assert_eq!(view.data_set().remote().call_count(), calls);
    }

    #[test]
    fn test_save_changes_commits_all_categories() {
        let view = seeded_view();
        block_on(view.add(task(4, "four"))).unwrap();
        block_on(view.update(task(1, "edited"))).unwrap();
        block_on(view.remove(&task(2, "two"))).unwrap();

        block_on(view.save_changes()).unwrap();

        assert!(view.changes().is_pristine());
        let set = view.data_set();
        assert_eq!(set.state_of(&4), Some(EntityState::Unchanged));
        assert_eq!(set.state_of(&1), Some(EntityState::Unchanged));
        assert_eq!(set.state_of(&2), None);

        let mut remote_ids: Vec<i64> = set.remote().rows().iter().map(|t| t.id).collect();
        remote_ids.sort_unstable();
        assert_eq!(remote_ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_save_changes_partial_failure() {
        let view = seeded_view();
        block_on(view.add(task(4, "four"))).unwrap();
        block_on(view.update(task(1, "edited"))).unwrap();
        view.data_set().remote().fail_key(4);

        let err = block_on(view.save_changes()).unwrap_err();
        match err {
            Error::PartialCommit { failed, total } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 2);
            }
            other => panic!("expected PartialCommit, got {other}"),
        }

        // The update settled; the create is still pending and retryable.
        let set = view.data_set();
        assert_eq!(set.state_of(&1), Some(EntityState::Unchanged));
        assert_eq!(set.state_of(&4), Some(EntityState::Added));

        set.remote().heal_key(&4);
        block_on(view.save_changes()).unwrap();
        assert_eq!(set.state_of(&4), Some(EntityState::Unchanged));
    }

    #[test]
    fn test_reset_entity_restores_without_remote_calls() {
        let view = seeded_view();
        let calls = view.data_set().remote().call_count();

        block_on(view.update(task(1, "edited"))).unwrap();
        view.reset_entity(&task(1, "edited")).unwrap();

        assert_eq!(view.find_by_key(&1).unwrap().title, "one");
        assert_eq!(view.data_set().state_of(&1), Some(EntityState::Unchanged));
        assert_eq!(view.data_set().remote().call_count(), calls);
    }

    #[test]
    fn test_add_save_entity_round_trip() {
        let view = seeded_view();

        block_on(view.add(task(4, "four"))).unwrap();
        block_on(view.save_entity(&task(4, "four"))).unwrap();

        assert_eq!(view.data_set().state_of(&4), Some(EntityState::Unchanged));
        let report = view.changes();
        assert!(report.added.iter().all(|t| t.id != 4));
        assert!(report.is_pristine());
    }

    #[test]
    fn test_load_and_find_by_key() {
        let view = seeded_view();

        assert_eq!(view.find_by_key(&1).unwrap().title, "one");
        assert!(view.find_by_key(&99).is_none());

        view.data_set().remote().put(task(5, "five"));
        let loaded = block_on(view.load(&5, FetchMode::Remote)).unwrap();
        assert_eq!(loaded.title, "five");
        assert_eq!(view.find_by_key(&5).unwrap().title, "five");
    }

    #[test]
    fn test_two_views_share_one_data_set() {
        let remote = MemoryRemote::with_rows(vec![task(1, "one"), task(2, "two")]);
        let set = Rc::new(BufferedDataSet::new(remote));

        let wide: DataView<Task, TestSet> = DataView::new(set.clone());
        let narrow: DataView<Task, TestSet> = DataView::new(set);
        narrow.query().filter(|t: &Task| t.id == 1);

        block_on(wide.refresh(FetchMode::Remote)).unwrap();
        assert_eq!(wide.projection().len(), 2);
        assert_eq!(narrow.projection().len(), 1);

        // A mutation through one view is immediately visible to the other.
        block_on(narrow.update(task(1, "edited"))).unwrap();
        assert_eq!(wide.projection()[0].title, "edited");
    }
}
