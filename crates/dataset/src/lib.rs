//! Strata Dataset - Buffered entity store with remote synchronization.
//!
//! This crate defines the data-set side of the strata data layer:
//!
//! - `DataSet`: the contract a buffered entity store exposes to views
//! - `RemoteSource`: the transport a data set replays its changes against
//! - `BufferedDataSet`: the reference `DataSet` implementation
//! - `MemoryRemote`: an in-process `RemoteSource` for tests and offline use
//! - `FetchMode`: remote-versus-buffer preference for fetch operations
//!
//! A `BufferedDataSet` owns the local buffer of entities, tags each one with
//! an `EntityState`, and replays pending creates/updates/deletes against its
//! `RemoteSource`. All completion signals are single-threaded futures; nothing
//! here is `Send`.
//!
//! # Example
//!
//! ```rust
//! use futures::executor::block_on;
//! use strata_core::{Entity, EntityState};
//! use strata_dataset::{BufferedDataSet, DataSet, MemoryRemote};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Task {
//!     id: i64,
//!     title: &'static str,
//! }
//!
//! impl Entity for Task {
//!     type Key = i64;
//!     fn key(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! let set = BufferedDataSet::new(MemoryRemote::new());
//! block_on(set.add(Task { id: 1, title: "triage inbox" })).unwrap();
//! assert_eq!(set.state_of(&1), Some(EntityState::Added));
//! ```

mod buffered;
mod dataset;
mod fetch;
mod remote;

pub use buffered::BufferedDataSet;
pub use dataset::DataSet;
pub use fetch::FetchMode;
pub use remote::{MemoryRemote, RemoteSource};

// Re-export commonly used types from dependencies
pub use strata_core::{Entity, EntityState, Error, Result};
pub use strata_query::EntityQuery;
