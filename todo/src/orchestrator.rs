//! Action orchestrator: the async lifecycle of each remote operation.
//!
//! Every operation is one effect:
//!
//! ```text
//! Sequential[ send(START), Future(remote call -> SUCCESS | FAIL) ]
//! ```
//!
//! START is applied before the remote call begins. The remote call runs to
//! completion; before its terminal action is emitted the session is checked,
//! and if the credential or user id changed meanwhile the terminal action is
//! replaced by `OperationDiscarded`.
//!
//! Failures are forwarded as their message text. Nothing here retries.

use crate::environment::TodoEnvironment;
use crate::persistence::{TodoPatch, TodoPersistence};
use crate::session::{AuthSession, SessionIdentity};
use crate::types::{Credential, EndpointId, ErrorField, Operation, TodoAction, TodoItem, UserId};
use std::future::Future;
use todo_store_core::{async_effect, effect::Effect};

/// Wraps a remote call in the START / terminal protocol
fn remote_operation<F>(
    operation: Operation,
    start: TodoAction,
    session: AuthSession,
    identity: SessionIdentity,
    call: F,
) -> Effect<TodoAction>
where
    F: Future<Output = TodoAction> + Send + 'static,
{
    Effect::chain(vec![
        Effect::send(start),
        async_effect! {
            let terminal = call.await;

            if !session.is_current(&identity) {
                tracing::warn!(
                    operation = %operation,
                    user_id = %identity.user_id,
                    "Session changed while the operation was in flight, discarding result"
                );
                return Some(TodoAction::OperationDiscarded { operation });
            }

            match terminal.failure() {
                Some(error) => tracing::warn!(operation = %operation, error, "Operation failed"),
                None => tracing::debug!(operation = %operation, "Operation succeeded"),
            }
            Some(terminal)
        },
    ])
}

/// Fetch the full remote list.
///
/// An absent remote collection resolves to `FETCH_TODO_SUCCESS` with no entries.
pub fn fetch_todos<P>(
    env: &TodoEnvironment<P>,
    credential: Credential,
    user_id: UserId,
) -> Effect<TodoAction>
where
    P: TodoPersistence + Clone + 'static,
{
    let persistence = env.persistence.clone();
    let identity = SessionIdentity::new(credential.clone(), user_id.clone());

    remote_operation(
        Operation::Fetch,
        TodoAction::FetchTodoStart,
        env.session.clone(),
        identity,
        async move {
            match persistence.list_items(&credential, &user_id).await {
                Ok(todos) => TodoAction::FetchTodoSuccess { todos },
                Err(error) => TodoAction::FetchTodoFail {
                    error: error.to_string(),
                },
            }
        },
    )
}

/// Persist the new item at the end of `todos`.
///
/// `todos` is the full intended list (existing items plus the new one); only
/// its last element is sent.
pub fn submit_todos<P>(
    env: &TodoEnvironment<P>,
    user_id: UserId,
    mut todos: Vec<TodoItem>,
    credential: Credential,
) -> Effect<TodoAction>
where
    P: TodoPersistence + Clone + 'static,
{
    let persistence = env.persistence.clone();
    let identity = SessionIdentity::new(credential.clone(), user_id.clone());

    remote_operation(
        Operation::Submit,
        TodoAction::SubmitTodoStart,
        env.session.clone(),
        identity,
        async move {
            let Some(new_todo) = todos.pop() else {
                return TodoAction::SubmitTodoFail {
                    error: "No todo to submit".to_string(),
                };
            };

            match persistence.create_item(&user_id, &new_todo, &credential).await {
                Ok(new_endpoint) => TodoAction::SubmitTodoSuccess {
                    new_todo,
                    new_endpoint,
                },
                Err(error) => TodoAction::SubmitTodoFail {
                    error: error.to_string(),
                },
            }
        },
    )
}

/// Persist the completed flag of the item stored under `endpoint`.
pub fn mark_as_completed<P>(
    env: &TodoEnvironment<P>,
    endpoint: EndpointId,
    index: usize,
    todo: &TodoItem,
    credential: Credential,
    user_id: UserId,
) -> Effect<TodoAction>
where
    P: TodoPersistence + Clone + 'static,
{
    let persistence = env.persistence.clone();
    let identity = SessionIdentity::new(credential.clone(), user_id.clone());
    tracing::debug!(endpoint = %endpoint, index, text = %todo.text, "Marking todo as completed");

    remote_operation(
        Operation::MarkAsCompleted,
        TodoAction::MarkAsCompletedStart,
        env.session.clone(),
        identity,
        async move {
            match persistence
                .update_item(&user_id, &endpoint, TodoPatch::completed(), &credential)
                .await
            {
                Ok(()) => TodoAction::MarkAsCompletedSuccess { index },
                Err(error) => TodoAction::MarkAsCompletedFail {
                    error: error.to_string(),
                },
            }
        },
    )
}

/// Remove the item stored under `endpoint`.
///
/// On success the resulting list is `todos` without the element at `index`.
pub fn delete_todo<P>(
    env: &TodoEnvironment<P>,
    endpoint: EndpointId,
    index: usize,
    todos: Vec<TodoItem>,
    credential: Credential,
    user_id: UserId,
) -> Effect<TodoAction>
where
    P: TodoPersistence + Clone + 'static,
{
    let persistence = env.persistence.clone();
    let identity = SessionIdentity::new(credential.clone(), user_id.clone());

    remote_operation(
        Operation::Delete,
        TodoAction::DeleteTodoStart,
        env.session.clone(),
        identity,
        async move {
            match persistence.delete_item(&user_id, &endpoint, &credential).await {
                Ok(()) => TodoAction::DeleteTodoSuccess {
                    old_todos: without_index(todos, index),
                    index,
                },
                Err(error) => TodoAction::DeleteTodoFail {
                    error: error.to_string(),
                },
            }
        },
    )
}

/// `todos` minus the element at `index` (unchanged if out of range)
fn without_index(mut todos: Vec<TodoItem>, index: usize) -> Vec<TodoItem> {
    if index < todos.len() {
        todos.remove(index);
    }
    todos
}

/// Clear one error channel
#[must_use]
pub const fn reset_error(error_type: ErrorField) -> TodoAction {
    TodoAction::ResetError { error_type }
}

/// Drop local list data after the credential went away
#[must_use]
pub const fn logout_user_data() -> TodoAction {
    TodoAction::LogoutUserData
}
