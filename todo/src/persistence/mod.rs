//! Persistence collaborator for remote to-do storage.
//!
//! The orchestrator only sees [`TodoPersistence`]. Two implementations ship:
//! [`HttpPersistence`] for a realtime-database style REST backend and
//! [`InMemoryPersistence`] for tests and offline runs.

use crate::types::{Credential, EndpointId, TodoEntry, TodoItem, UserId};
use thiserror::Error;

mod http;
mod memory;

pub use http::HttpPersistence;
pub use memory::InMemoryPersistence;

/// Errors from the persistence collaborator
///
/// The `Display` text is what the user sees in the matching error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// No connection could be made, so nothing reached the backend
    #[error("Could not connect: {0}")]
    Connect(String),

    /// The request was sent but never produced a response (timeout, reset, TLS)
    #[error("Request failed: {0}")]
    Request(String),

    /// The backend rejected the credential
    #[error("Permission denied")]
    Unauthorized,

    /// The backend answered with a non-success status
    #[error("Request failed with status code {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The backend is temporarily unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The addressed item does not exist
    #[error("Todo {0} not found")]
    NotFound(EndpointId),
}

impl PersistenceError {
    /// Returns `true` if retrying the same request may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Connect(_) | Self::Request(_) | Self::Unavailable(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Unauthorized | Self::Decode(_) | Self::NotFound(_) => false,
        }
    }

    /// Returns `true` if the backend cannot have seen the request.
    ///
    /// Only these failures are safe to resend for non-idempotent requests.
    #[must_use]
    pub const fn is_unsent(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

/// Fields a partial update may change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TodoPatch {
    /// New completed flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// Patch that marks an item as completed
    #[must_use]
    pub const fn completed() -> Self {
        Self {
            completed: Some(true),
        }
    }
}

/// Remote storage for one user's to-do list.
///
/// Implementations own transport concerns (addressing, encoding, retries).
pub trait TodoPersistence: Send + Sync {
    /// List the user's items in storage order.
    ///
    /// An absent collection is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credential is rejected.
    fn list_items(
        &self,
        credential: &Credential,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<TodoEntry>, PersistenceError>> + Send;

    /// Store a new item and return the endpoint id assigned to it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credential is rejected.
    fn create_item(
        &self,
        user_id: &UserId,
        item: &TodoItem,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<EndpointId, PersistenceError>> + Send;

    /// Apply a partial update to the item stored under `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credential is rejected.
    fn update_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        patch: TodoPatch,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Remove the item stored under `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credential is rejected.
    fn delete_item(
        &self,
        user_id: &UserId,
        endpoint: &EndpointId,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;
}
