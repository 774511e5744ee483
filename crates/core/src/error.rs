//! Error types for the strata data layer.

use crate::state::EntityState;
use alloc::format;
use alloc::string::String;
use core::fmt;

/// Result type alias for strata operations.
pub type Result<T> = core::result::Result<T, Error>;

/// The remote verb that an operation was performing when it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Fetch,
    Create,
    Update,
    Remove,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::Fetch => "fetch",
            RemoteOp::Create => "create",
            RemoteOp::Update => "update",
            RemoteOp::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// Error types for data-layer operations.
#[derive(Debug)]
pub enum Error {
    /// A lookup or load targeted a key that does not resolve.
    NotFound {
        key: String,
    },
    /// A key collided with an entity already present in the buffer.
    DuplicateKey {
        key: String,
    },
    /// A single remote operation was rejected by the endpoint or transport.
    Remote {
        op: RemoteOp,
        message: String,
    },
    /// A batch commit where at least one constituent operation failed.
    ///
    /// Carries counts only; callers re-inspect per-entity state to learn
    /// which operations failed.
    PartialCommit {
        failed: usize,
        total: usize,
    },
    /// An operation requested an illegal entity state transition.
    InvalidTransition {
        from: EntityState,
        op: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { key } => {
                write!(f, "Entity not found: {}", key)
            }
            Error::DuplicateKey { key } => {
                write!(f, "Entity already buffered: {}", key)
            }
            Error::Remote { op, message } => {
                write!(f, "Remote {} failed: {}", op, message)
            }
            Error::PartialCommit { failed, total } => {
                write!(f, "Batch commit: {} of {} operations failed", failed, total)
            }
            Error::InvalidTransition { from, op } => {
                write!(f, "Cannot {} an entity in state {}", op, from)
            }
        }
    }
}

impl Error {
    /// Creates a not found error from a key's debug rendering.
    pub fn not_found(key: impl fmt::Debug) -> Self {
        Error::NotFound {
            key: format!("{:?}", key),
        }
    }

    /// Creates a duplicate key error from a key's debug rendering.
    pub fn duplicate_key(key: impl fmt::Debug) -> Self {
        Error::DuplicateKey {
            key: format!("{:?}", key),
        }
    }

    /// Creates a remote operation error.
    pub fn remote(op: RemoteOp, message: impl Into<String>) -> Self {
        Error::Remote {
            op,
            message: message.into(),
        }
    }

    /// Creates a partial batch commit error.
    pub fn partial_commit(failed: usize, total: usize) -> Self {
        Error::PartialCommit { failed, total }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(from: EntityState, op: &'static str) -> Self {
        Error::InvalidTransition { from, op }
    }

    /// Returns true for errors raised by a remote endpoint or transport.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote { .. } | Error::PartialCommit { .. })
    }
}
