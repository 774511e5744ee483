//! Fetch preference for remote-backed read operations.

/// Whether a fetch operation must hit the remote source or may be served
/// from the local buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FetchMode {
    /// Always consult the remote source.
    #[default]
    Remote,
    /// Serve from the buffer when the data is already materialized.
    Local,
}
