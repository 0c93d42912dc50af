//! Injected collaborators for the to-do reducer.

use crate::persistence::TodoPersistence;
use crate::session::AuthSession;

/// Environment dependencies for the to-do reducer
///
/// # Type Parameters
///
/// - `P`: Persistence collaborator
#[derive(Clone, Debug)]
pub struct TodoEnvironment<P>
where
    P: TodoPersistence + Clone,
{
    /// Remote storage for the list
    pub persistence: P,
    /// Current credential and user id, consulted before results are applied
    pub session: AuthSession,
}

impl<P> TodoEnvironment<P>
where
    P: TodoPersistence + Clone,
{
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub const fn new(persistence: P, session: AuthSession) -> Self {
        Self {
            persistence,
            session,
        }
    }
}
