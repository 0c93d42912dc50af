//! Reducer logic for the to-do list.
//!
//! Transitions are plain state updates. Intents leave state untouched and
//! return the orchestrator effect for their operation family.

use crate::environment::TodoEnvironment;
use crate::orchestrator;
use crate::persistence::TodoPersistence;
use crate::types::{TodoAction, TodoState, split_entries};
use todo_store_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Reducer for the to-do list
///
/// Generic over the persistence collaborator `P`.
#[derive(Debug, Clone)]
pub struct TodoReducer<P> {
    _phantom: std::marker::PhantomData<P>,
}

impl<P> TodoReducer<P> {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }

    /// START of submit, mark-as-completed and delete
    fn begin_write(state: &mut TodoState) {
        state.loading = true;
        state.submit_todo_success = false;
        state.submit_complete_delete_todo_error.clear();
    }

    /// SUCCESS of submit, mark-as-completed and delete
    fn finish_write(state: &mut TodoState) {
        state.loading = false;
        state.submit_todo_success = true;
        state.submit_complete_delete_todo_error.clear();
    }

    /// FAIL of submit, mark-as-completed and delete
    fn fail_write(state: &mut TodoState, error: String) {
        state.loading = false;
        state.submit_todo_success = false;
        state.submit_complete_delete_todo_error = error;
    }

    /// Applies a transition to state
    fn apply(state: &mut TodoState, action: TodoAction) {
        match action {
            TodoAction::FetchTodoStart => {
                state.loading = true;
                state.fetch_todo_error.clear();
            },
            TodoAction::FetchTodoSuccess { todos } => {
                let (todos, endpoints) = split_entries(todos);
                state.loading = false;
                state.todos = todos;
                state.endpoints_arr = endpoints;
            },
            TodoAction::FetchTodoFail { error } => {
                state.loading = false;
                state.fetch_todo_error = error;
            },

            TodoAction::SubmitTodoStart
            | TodoAction::MarkAsCompletedStart
            | TodoAction::DeleteTodoStart => Self::begin_write(state),

            TodoAction::SubmitTodoSuccess {
                new_todo,
                new_endpoint,
            } => {
                Self::finish_write(state);
                state.todos.push(new_todo);
                state.endpoints_arr.push(new_endpoint);
            },
            TodoAction::MarkAsCompletedSuccess { index } => {
                Self::finish_write(state);
                match state.todos.get_mut(index) {
                    Some(todo) => todo.completed = true,
                    None => tracing::warn!(
                        index,
                        len = state.todos.len(),
                        "Completed index out of range, no todo updated"
                    ),
                }
            },
            TodoAction::DeleteTodoSuccess { old_todos, index } => {
                Self::finish_write(state);
                state.todos = old_todos;
                if index < state.endpoints_arr.len() {
                    state.endpoints_arr.remove(index);
                } else {
                    tracing::warn!(
                        index,
                        len = state.endpoints_arr.len(),
                        "Deleted index out of range, no endpoint removed"
                    );
                }
                if !state.is_aligned() {
                    tracing::warn!(
                        todos = state.todos.len(),
                        endpoints = state.endpoints_arr.len(),
                        "Todos and endpoints diverged after delete"
                    );
                }
            },

            TodoAction::SubmitTodoFail { error }
            | TodoAction::MarkAsCompletedFail { error }
            | TodoAction::DeleteTodoFail { error } => Self::fail_write(state, error),

            TodoAction::ResetError { error_type } => {
                state.error_mut(error_type).clear();
            },
            TodoAction::LogoutUserData => {
                state.todos.clear();
                state.endpoints_arr.clear();
            },
            TodoAction::OperationDiscarded { operation } => {
                tracing::debug!(operation = %operation, "Clearing loading flag for discarded result");
                state.loading = false;
            },

            // Intents are handled in `reduce`
            TodoAction::FetchTodos { .. }
            | TodoAction::SubmitTodos { .. }
            | TodoAction::MarkAsCompleted { .. }
            | TodoAction::DeleteTodo { .. }
            | TodoAction::Unknown => {},
        }
    }
}

impl<P> Default for TodoReducer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Reducer for TodoReducer<P>
where
    P: TodoPersistence + Clone + 'static,
{
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment<P>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Intents ==========
            TodoAction::FetchTodos {
                credential,
                user_id,
            } => smallvec![orchestrator::fetch_todos(env, credential, user_id)],

            TodoAction::SubmitTodos {
                user_id,
                todos,
                credential,
            } => smallvec![orchestrator::submit_todos(env, user_id, todos, credential)],

            TodoAction::MarkAsCompleted {
                endpoint,
                index,
                todo,
                credential,
                user_id,
            } => smallvec![orchestrator::mark_as_completed(
                env, endpoint, index, &todo, credential, user_id
            )],

            TodoAction::DeleteTodo {
                endpoint,
                index,
                todos,
                credential,
                user_id,
            } => smallvec![orchestrator::delete_todo(
                env, endpoint, index, todos, credential, user_id
            )],

            // ========== Transitions ==========
            transition => {
                Self::apply(state, transition);
                SmallVec::new()
            },
        }
    }
}
