//! Observer registry for projection changes.
//!
//! A view notifies its observers with the new projected sequence whenever the
//! cached projection becomes structurally different. Observers are plain
//! callbacks; registration order is emission order.

use std::rc::Rc;

/// Handle for a registered observer.
pub type ObserverId = u64;

/// A registered projection callback. Shared so a notification pass can run
/// against a snapshot while the registry itself stays reconfigurable.
pub type ProjectionCallback<T> = Rc<dyn Fn(&[T])>;

/// Registry of projection observers for one view.
pub struct ViewObservers<T> {
    entries: Vec<(ObserverId, ProjectionCallback<T>)>,
    next_id: ObserverId,
}

impl<T> Default for ViewObservers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewObservers<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a callback; returns its handle.
    pub fn observe<F>(&mut self, callback: F) -> ObserverId
    where
        F: Fn(&[T]) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Rc::new(callback)));
        id
    }

    /// Removes an observer. Returns true if it was registered.
    pub fn forget(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Emits a projection to every observer, in registration order.
    pub fn emit(&self, rows: &[T]) {
        for (_, callback) in &self.entries {
            callback(rows);
        }
    }

    /// Returns the current callbacks, in registration order.
    ///
    /// Callers holding the registry behind a `RefCell` notify from this
    /// snapshot so a callback can observe or forget without hitting a live
    /// borrow.
    pub fn callbacks(&self) -> Vec<ProjectionCallback<T>> {
        self.entries.iter().map(|(_, cb)| cb.clone()).collect()
    }

    /// Returns the number of registered observers.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no observers are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
