//! Facade a presentation layer talks to.
//!
//! [`TodoClient`] owns the store and the session. Each remote operation
//! checks the session and the loading flag, sends its intent, and waits for
//! the terminal action the orchestrator feeds back.

use crate::environment::TodoEnvironment;
use crate::error::TodoError;
use crate::input::SubmissionPolicy;
use crate::persistence::TodoPersistence;
use crate::reducer::TodoReducer;
use crate::session::{AuthSession, SessionIdentity, SessionWatcher};
use crate::types::{Credential, ErrorField, Operation, TodoAction, TodoState, TodoView, UserId};
use crate::TodoStore;
use std::time::Duration;
use todo_store_runtime::{StoreConfig, StoreError};
use tokio::sync::{Mutex, MutexGuard};

/// UI-facing handle to the to-do list
pub struct TodoClient<P>
where
    P: TodoPersistence + Clone + 'static,
{
    store: TodoStore<P>,
    session: AuthSession,
    policy: SubmissionPolicy,
    operation_timeout: Duration,
    in_flight: Mutex<()>,
    watcher: SessionWatcher,
}

impl<P> TodoClient<P>
where
    P: TodoPersistence + Clone + 'static,
{
    /// Create the store and start watching the session for ended sessions.
    ///
    /// Graceful shutdown of the store waits at most `operation_timeout`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    #[must_use]
    pub fn new(
        persistence: P,
        session: AuthSession,
        policy: SubmissionPolicy,
        operation_timeout: Duration,
    ) -> Self {
        let environment = TodoEnvironment::new(persistence, session.clone());
        let store = TodoStore::<P>::with_config(
            TodoState::new(),
            TodoReducer::new(),
            environment,
            StoreConfig::default()
                .with_broadcast_capacity(64)
                .with_shutdown_timeout(operation_timeout),
        );
        let watcher = SessionWatcher::spawn(&session, store.clone());

        Self {
            store,
            session,
            policy,
            operation_timeout,
            in_flight: Mutex::new(()),
            watcher,
        }
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore<P> {
        &self.store
    }

    /// The session this client reads credentials from
    #[must_use]
    pub const fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Current read model
    pub async fn view(&self) -> TodoView {
        let identity = self.session.current();
        let (credential, user_id) = identity.map(|i| (i.credential, i.user_id)).unzip();
        self.store
            .state(|state| TodoView::new(state, credential, user_id))
            .await
    }

    /// Load the remote list, replacing the local one.
    ///
    /// # Errors
    ///
    /// - [`TodoError::NotSignedIn`], [`TodoError::Busy`]
    /// - [`TodoError::Failed`] if the fetch failed (also recorded in `fetchTodoError`)
    /// - [`TodoError::Discarded`], [`TodoError::Store`]
    pub async fn fetch_todos(&self) -> Result<(), TodoError> {
        let (_guard, identity) = self.begin().await?;

        self.dispatch(
            Operation::Fetch,
            TodoAction::FetchTodos {
                credential: identity.credential,
                user_id: identity.user_id,
            },
        )
        .await
    }

    /// Add an item with `text`.
    ///
    /// The text is clamped to the policy's length, and the submission is
    /// rejected before dispatch if it is empty or the list is full.
    ///
    /// # Errors
    ///
    /// - [`TodoError::Rejected`] for an empty text or a full list
    /// - [`TodoError::NotSignedIn`], [`TodoError::Busy`]
    /// - [`TodoError::Failed`], [`TodoError::Discarded`], [`TodoError::Store`]
    pub async fn submit_todo(&self, text: &str) -> Result<(), TodoError> {
        let (_guard, identity) = self.begin().await?;

        let todos = self.store.state(|s| s.todos.clone()).await;
        let intended = self.policy.prepare_submission(&todos, text)?;

        self.dispatch(
            Operation::Submit,
            TodoAction::SubmitTodos {
                user_id: identity.user_id,
                todos: intended,
                credential: identity.credential,
            },
        )
        .await
    }

    /// Mark the item at `index` as completed.
    ///
    /// # Errors
    ///
    /// - [`TodoError::UnknownIndex`] if no item is at `index`
    /// - [`TodoError::NotSignedIn`], [`TodoError::Busy`]
    /// - [`TodoError::Failed`], [`TodoError::Discarded`], [`TodoError::Store`]
    pub async fn mark_as_completed(&self, index: usize) -> Result<(), TodoError> {
        let (_guard, identity) = self.begin().await?;

        let (endpoint, todo) = self
            .store
            .state(|s| s.endpoint_at(index).cloned().zip(s.todos.get(index).cloned()))
            .await
            .ok_or(TodoError::UnknownIndex(index))?;

        self.dispatch(
            Operation::MarkAsCompleted,
            TodoAction::MarkAsCompleted {
                endpoint,
                index,
                todo,
                credential: identity.credential,
                user_id: identity.user_id,
            },
        )
        .await
    }

    /// Delete the item at `index`.
    ///
    /// # Errors
    ///
    /// - [`TodoError::UnknownIndex`] if no item is at `index`
    /// - [`TodoError::NotSignedIn`], [`TodoError::Busy`]
    /// - [`TodoError::Failed`], [`TodoError::Discarded`], [`TodoError::Store`]
    pub async fn delete_todo(&self, index: usize) -> Result<(), TodoError> {
        let (_guard, identity) = self.begin().await?;

        let (endpoint, todos) = self
            .store
            .state(|s| s.endpoint_at(index).cloned().map(|e| (e, s.todos.clone())))
            .await
            .ok_or(TodoError::UnknownIndex(index))?;

        self.dispatch(
            Operation::Delete,
            TodoAction::DeleteTodo {
                endpoint,
                index,
                todos,
                credential: identity.credential,
                user_id: identity.user_id,
            },
        )
        .await
    }

    /// Clear one error channel.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if the store is shutting down.
    pub async fn reset_error(&self, field: ErrorField) -> Result<(), TodoError> {
        self.store.send(crate::orchestrator::reset_error(field)).await?;
        Ok(())
    }

    /// Sign in as `user_id`.
    ///
    /// If another user was signed in, their list is cleared before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if the previous list was not cleared
    /// within the operation timeout.
    pub async fn sign_in(&self, credential: Credential, user_id: UserId) -> Result<(), TodoError> {
        self.session.sign_in(credential, user_id);
        self.session_settled().await
    }

    /// Sign out and clear the local list.
    ///
    /// An operation in flight finishes (its result is discarded) before the
    /// list is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::Store`] if the list was not cleared within the
    /// operation timeout.
    pub async fn sign_out(&self) -> Result<(), TodoError> {
        self.session.sign_out();
        self.session_settled().await
    }

    /// Waits until the watcher has handled every session change so far
    async fn session_settled(&self) -> Result<(), TodoError> {
        tokio::time::timeout(
            self.operation_timeout,
            self.watcher.settled(self.session.version()),
        )
        .await
        .map_err(|_| TodoError::Store(StoreError::Timeout))
    }

    /// Claims the single operation slot for the current identity
    async fn begin(&self) -> Result<(MutexGuard<'_, ()>, SessionIdentity), TodoError> {
        // A previous user's list must be gone before anything runs for the next one
        self.session_settled().await?;
        let identity = self.session.current().ok_or(TodoError::NotSignedIn)?;

        let guard = self.in_flight.try_lock().map_err(|_| TodoError::Busy)?;
        if self.store.state(|s| s.loading).await {
            return Err(TodoError::Busy);
        }
        Ok((guard, identity))
    }

    async fn dispatch(&self, operation: Operation, intent: TodoAction) -> Result<(), TodoError> {
        tracing::debug!(operation = %operation, "Dispatching intent");

        let terminal = self
            .store
            .send_and_wait_for(
                intent,
                move |action| action.is_terminal_for(operation),
                self.operation_timeout,
            )
            .await?;

        if let Some(message) = terminal.failure() {
            return Err(TodoError::Failed {
                operation,
                message: message.to_string(),
            });
        }
        if matches!(terminal, TodoAction::OperationDiscarded { .. }) {
            return Err(TodoError::Discarded(operation));
        }
        Ok(())
    }
}

impl<P> std::fmt::Debug for TodoClient<P>
where
    P: TodoPersistence + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoClient")
            .field("session", &self.session)
            .field("policy", &self.policy)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
