//! Strata Query - Filter/sort/page configuration for the strata data layer.
//!
//! An `EntityQuery` describes how a buffered entity sequence is projected for
//! presentation: an optional filter predicate, an optional stable sort, and a
//! paging window. It is a configuration object, not a query language; the
//! predicate and sort key are plain closures supplied by the caller.
//!
//! All configuration goes through `&self` (interior mutability), so a query
//! shared behind an `Rc` can be reconfigured while a view holds it.
//!
//! # Example
//!
//! ```rust
//! use strata_query::{EntityQuery, SortDirection};
//!
//! let query: EntityQuery<i64> = EntityQuery::new();
//! query.filter(|n| n % 2 == 0);
//! query.order_by_key(|n| *n, SortDirection::Descending);
//! query.set_page_size(2);
//!
//! let page = query.apply(&[5, 2, 8, 4, 7, 6], true);
//! assert_eq!(page, vec![8, 6]);
//! ```

#![no_std]

extern crate alloc;

mod query;
mod sort;

pub use query::EntityQuery;
pub use sort::SortDirection;
