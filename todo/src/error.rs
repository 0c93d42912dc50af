//! Errors surfaced by [`TodoClient`](crate::TodoClient).

use crate::input::SubmitRejection;
use crate::types::Operation;
use thiserror::Error;
use todo_store_runtime::StoreError;

/// Errors returned by client operations
#[derive(Error, Debug)]
pub enum TodoError {
    /// No credential or user id is available
    #[error("Not signed in")]
    NotSignedIn,

    /// Another operation is still in flight
    #[error("An operation is already in progress")]
    Busy,

    /// No item at this position
    #[error("No todo at index {0}")]
    UnknownIndex(usize),

    /// The submission broke a list limit and was not dispatched
    #[error(transparent)]
    Rejected(#[from] SubmitRejection),

    /// The remote operation failed; the message is also in the store's error field
    #[error("{operation} failed: {message}")]
    Failed {
        /// Which operation
        operation: Operation,
        /// Failure text recorded in state
        message: String,
    },

    /// The session changed before the result arrived
    #[error("{0} result discarded after the session changed")]
    Discarded(Operation),

    /// Store runtime error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
