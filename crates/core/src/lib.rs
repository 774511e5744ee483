//! Strata Core - Core entity model for the strata data layer.
//!
//! This crate provides the foundational types shared by every strata crate:
//!
//! - `Entity`: trait for keyed records that can be buffered and synchronized
//! - `EntityState`: per-entity pending-change classification
//! - `Tracked`: a buffered entity together with its pristine original and state
//! - `Error`: error types for data-layer operations
//!
//! # Example
//!
//! ```rust
//! use strata_core::{Entity, EntityState, Tracked};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Contact {
//!     id: i64,
//!     name: &'static str,
//! }
//!
//! impl Entity for Contact {
//!     type Key = i64;
//!     fn key(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! let mut tracked = Tracked::new(Contact { id: 1, name: "Ada" });
//! assert_eq!(tracked.state(), EntityState::Unchanged);
//!
//! tracked.update(Contact { id: 1, name: "Grace" }).unwrap();
//! assert_eq!(tracked.state(), EntityState::Modified);
//!
//! tracked.reset();
//! assert_eq!(tracked.entity().name, "Ada");
//! ```

#![no_std]

extern crate alloc;

mod entity;
mod error;
mod state;
mod tracked;

pub use entity::Entity;
pub use error::{Error, RemoteOp, Result};
pub use state::EntityState;
pub use tracked::{CommitOutcome, ResetOutcome, Tracked};
