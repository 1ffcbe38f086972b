//! Store-specific error types.

use thiserror::Error;

/// Errors surfaced by the store adapter.
///
/// `Unavailable` means connectivity: the backend could not be reached or a
/// command timed out. Endpoint handlers map it to 500 (503 for health).
/// `Command` means the backend was reachable but rejected or failed the
/// command itself (wrong key type, missing module, malformed reply).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or timeout failure against the backing store.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store executed the command and reported a failure.
    #[error("store command failed: {0}")]
    Command(String),
}

impl StoreError {
    /// True if the error indicates the store could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
