//! Bounded to-do list backed by a reducer store.
//!
//! The list lives in a single [`TodoStore`]. Every change goes through
//! [`TodoReducer`] as a [`TodoAction`]; remote work is described by the
//! [`orchestrator`] as effects that the store runs and feeds back.
//!
//! # Architecture
//!
//! ```text
//! TodoClient ──intent──▶ TodoReducer ──Sequential[START, Future]──▶ Store
//!     ▲                                                         │
//!     │                          TodoPersistence ◀── remote call ┘
//!     └──── terminal action (SUCCESS | FAIL | discarded) ◀──────┘
//! ```
//!
//! - [`types`]: items, endpoint ids, state, actions, read model
//! - [`reducer`]: the pure state transitions
//! - [`orchestrator`]: START / remote call / SUCCESS or FAIL per operation
//! - [`persistence`]: the remote collaborator (HTTP and in-memory)
//! - [`session`]: credential and user id, plus the logout rule
//! - [`input`]: limits applied before a submission is dispatched
//! - [`client`]: the facade a presentation layer talks to

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod persistence;
pub mod reducer;
pub mod session;
pub mod types;

pub use client::TodoClient;
pub use config::Config;
pub use environment::TodoEnvironment;
pub use error::TodoError;
pub use input::{SubmissionPolicy, SubmitRejection};
pub use persistence::{HttpPersistence, InMemoryPersistence, PersistenceError, TodoPersistence};
pub use reducer::TodoReducer;
pub use session::{AuthSession, SessionIdentity, SessionWatcher};
pub use types::*;

use todo_store_runtime::Store;

/// The one store holding the to-do list
pub type TodoStore<P> = Store<TodoState, TodoAction, TodoEnvironment<P>, TodoReducer<P>>;
