//! Authorization collaborator and the logout rule.
//!
//! [`AuthSession`] holds the current credential and user id and lets other
//! components observe changes. [`SessionWatcher`] turns the end of a user's
//! session into a `LOGOUT_USER_DATA` dispatch, outside of any rendering path.

use crate::TodoStore;
use crate::persistence::TodoPersistence;
use crate::types::{Credential, TodoAction, UserId};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Credential and user id of a signed-in user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Token for remote operations
    pub credential: Credential,
    /// The signed-in user
    pub user_id: UserId,
}

impl SessionIdentity {
    /// Pairs a credential with its user
    #[must_use]
    pub const fn new(credential: Credential, user_id: UserId) -> Self {
        Self {
            credential,
            user_id,
        }
    }
}

/// One value of the session cell
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionState {
    /// Bumped on every sign-in and sign-out
    version: u64,
    /// Bumped whenever a signed-in user's session ends
    ended: u64,
    identity: Option<SessionIdentity>,
}

/// Observable authentication state
///
/// Clones share the same cell.
#[derive(Clone, Debug)]
pub struct AuthSession {
    state: Arc<watch::Sender<SessionState>>,
}

impl AuthSession {
    /// A session nobody is signed into
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// A session already signed in as `user_id`
    #[must_use]
    pub fn signed_in(credential: Credential, user_id: UserId) -> Self {
        let session = Self::new();
        session.sign_in(credential, user_id);
        session
    }

    /// Replace the current identity.
    ///
    /// Signing in as a different user ends the previous user's session.
    pub fn sign_in(&self, credential: Credential, user_id: UserId) {
        tracing::info!(user_id = %user_id, "Signed in");
        let identity = SessionIdentity::new(credential, user_id);

        self.state.send_modify(|state| {
            if state
                .identity
                .as_ref()
                .is_some_and(|previous| previous.user_id != identity.user_id)
            {
                state.ended += 1;
            }
            state.version += 1;
            state.identity = Some(identity);
        });
    }

    /// Clear the credential and user id
    pub fn sign_out(&self) {
        let mut previous = None;
        self.state.send_modify(|state| {
            previous = state.identity.take();
            if previous.is_some() {
                state.ended += 1;
            }
            state.version += 1;
        });

        if let Some(previous) = previous {
            tracing::info!(user_id = %previous.user_id, "Signed out");
        }
    }

    /// The current identity, if signed in
    #[must_use]
    pub fn current(&self) -> Option<SessionIdentity> {
        self.state.borrow().identity.clone()
    }

    /// Number of sign-ins and sign-outs so far
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns `true` if `identity` is still the signed-in identity
    #[must_use]
    pub fn is_current(&self, identity: &SessionIdentity) -> bool {
        self.state.borrow().identity.as_ref() == Some(identity)
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches `LOGOUT_USER_DATA` whenever a signed-in user's session ends,
/// either by signing out or by another user signing in.
///
/// Changes are compared against the last state the watcher handled, so a
/// sign-out followed quickly by a sign-in is never missed. If an operation is
/// in flight, the dispatch waits until the store is no longer loading.
///
/// The task stops when the watcher is dropped.
#[derive(Debug)]
pub struct SessionWatcher {
    task: JoinHandle<()>,
    settled: watch::Receiver<u64>,
}

impl SessionWatcher {
    /// Start watching `session` on behalf of `store`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn spawn<P>(session: &AuthSession, store: TodoStore<P>) -> Self
    where
        P: TodoPersistence + Clone + 'static,
    {
        let mut changes = session.subscribe();
        let mut seen = changes.borrow_and_update().clone();
        let (settled_tx, settled) = watch::channel(seen.version);

        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let current = changes.borrow_and_update().clone();
                if current.ended != seen.ended {
                    Self::logout(&store).await;
                }
                settled_tx.send_replace(current.version);
                seen = current;
            }

            tracing::debug!("Session dropped, watcher stopping");
        });

        Self { task, settled }
    }

    /// Wait until every session change up to `version` has been handled
    pub async fn settled(&self, version: u64) {
        let mut settled = self.settled.clone();
        let handled = settled.wait_for(|handled| *handled >= version).await.is_ok();
        if !handled {
            tracing::debug!(version, "Session watcher stopped before settling");
        }
    }

    async fn logout<P>(store: &TodoStore<P>)
    where
        P: TodoPersistence + Clone + 'static,
    {
        let mut actions = store.subscribe_actions();

        while store.state(|s| s.loading).await {
            tracing::debug!("Operation in flight, deferring logout cleanup");
            match actions.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        match store.send(TodoAction::LogoutUserData).await {
            Ok(_) => tracing::info!("Cleared local todo data after the session ended"),
            Err(error) => tracing::warn!(error = %error, "Could not clear local todo data"),
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
