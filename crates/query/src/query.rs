//! The `EntityQuery` configuration object and its evaluator.

use crate::sort::SortDirection;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::cmp::Ordering;

type Predicate<T> = Box<dyn Fn(&T) -> bool>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Filter, sort, and paging configuration applied to an entity sequence.
///
/// One query belongs to one view. A page size of zero or less means "no
/// paging": `apply` operates on the full filtered sequence regardless of the
/// `respect_paging` flag.
pub struct EntityQuery<T> {
    predicate: RefCell<Option<Predicate<T>>>,
    order: RefCell<Option<(Comparator<T>, SortDirection)>>,
    page_size: Cell<i64>,
    page_index: Cell<i64>,
}

impl<T> Default for EntityQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityQuery<T> {
    /// Creates an empty query: no filter, no ordering, no paging.
    pub fn new() -> Self {
        Self {
            predicate: RefCell::new(None),
            order: RefCell::new(None),
            page_size: Cell::new(0),
            page_index: Cell::new(0),
        }
    }

    /// Sets the filter predicate, replacing any previous one.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) {
        *self.predicate.borrow_mut() = Some(Box::new(predicate));
    }

    /// Removes the filter predicate.
    pub fn clear_filter(&self) {
        *self.predicate.borrow_mut() = None;
    }

    /// Returns true if a filter predicate is configured.
    pub fn has_filter(&self) -> bool {
        self.predicate.borrow().is_some()
    }

    /// Tests a single entity against the filter predicate.
    ///
    /// An unfiltered query matches everything.
    pub fn matches(&self, entity: &T) -> bool {
        self.predicate.borrow().as_ref().map_or(true, |pred| pred(entity))
    }

    /// Sets the sort comparator, replacing any previous ordering.
    pub fn order_by(
        &self,
        comparator: impl Fn(&T, &T) -> Ordering + 'static,
        direction: SortDirection,
    ) {
        *self.order.borrow_mut() = Some((Box::new(comparator), direction));
    }

    /// Sets the ordering from a sort-key extractor.
    pub fn order_by_key<K: Ord>(
        &self,
        key: impl Fn(&T) -> K + 'static,
        direction: SortDirection,
    ) {
        self.order_by(move |a, b| key(a).cmp(&key(b)), direction);
    }

    /// Removes the ordering.
    pub fn clear_order(&self) {
        *self.order.borrow_mut() = None;
    }

    /// Returns the configured page size. Zero or negative means unpaged.
    #[inline]
    pub fn page_size(&self) -> i64 {
        self.page_size.get()
    }

    /// Sets the page size.
    pub fn set_page_size(&self, size: i64) {
        self.page_size.set(size);
    }

    /// Returns the zero-based page cursor.
    #[inline]
    pub fn page_index(&self) -> i64 {
        self.page_index.get()
    }

    /// Sets the zero-based page cursor. Negative values read as page zero.
    pub fn set_page_index(&self, index: i64) {
        self.page_index.set(index);
    }

    /// Projects an entity sequence through this query.
    ///
    /// Filters, then stable-sorts, then slices the configured page when
    /// `respect_paging` is set and paging is active. A page beyond the end of
    /// the filtered sequence yields an empty result.
    pub fn apply(&self, entities: &[T], respect_paging: bool) -> Vec<T>
    where
        T: Clone,
    {
        let predicate = self.predicate.borrow();
        let mut result: Vec<T> = match predicate.as_ref() {
            Some(pred) => entities.iter().filter(|e| pred(e)).cloned().collect(),
            None => entities.to_vec(),
        };

        if let Some((comparator, direction)) = self.order.borrow().as_ref() {
            result.sort_by(|a, b| direction.orient(comparator(a, b)));
        }

        let size = self.page_size.get();
        if respect_paging && size > 0 {
            let size = size as usize;
            let start = (self.page_index.get().max(0) as usize).saturating_mul(size);
            result = if start >= result.len() {
                Vec::new()
            } else {
                result.into_iter().skip(start).take(size).collect()
            };
        }

        result
    }
}
