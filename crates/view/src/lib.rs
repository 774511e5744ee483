//! Strata View - Reactive, change-aware data views.
//!
//! A `DataView` composes one `DataSet` and one `EntityQuery` into a cached,
//! filtered, paginated projection of the buffered entities, and exposes the
//! read/write/sync contract of the data layer:
//!
//! - `projection()`: the cached projection, recomputed only when necessary
//! - `observe()`: change notification, fired only on structural difference
//! - `changes()`: on-demand classification of pending entities by state
//! - `save_changes()`: batch commit of all pending changes as one joined
//!   completion with partial-failure visibility
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use strata_view::{DataView, FetchMode};
//!
//! let view = DataView::new(Rc::new(set));
//! view.query().set_page_size(25);
//!
//! view.refresh(FetchMode::Remote).await?;
//! let page = view.projection();
//!
//! view.add(entity).await?;
//! view.save_changes().await?;
//! ```

mod commit;
mod observers;
mod report;
mod view;

pub use observers::{ObserverId, ProjectionCallback, ViewObservers};
pub use report::ChangeReport;
pub use view::DataView;

// Re-export commonly used types from dependencies
pub use strata_core::{Entity, EntityState, Error, Result};
pub use strata_dataset::{DataSet, FetchMode};
pub use strata_query::{EntityQuery, SortDirection};
