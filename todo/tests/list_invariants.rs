//! Property tests for the reducer
//!
//! Replays random sequences of transitions, shaped the way the orchestrator
//! produces them, and checks that the item and endpoint sequences never
//! drift apart.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use todo_list::{
    AuthSession, EndpointId, ErrorField, InMemoryPersistence, TodoAction, TodoEntry,
    TodoEnvironment, TodoItem, TodoReducer, TodoState,
};
use todo_store_core::reducer::Reducer;

/// One step of a client session, before it is turned into actions
#[derive(Debug, Clone)]
enum Step {
    Fetch(Vec<(String, bool)>),
    FetchFail,
    Submit(String),
    Mark(usize),
    Delete(usize),
    WriteFail(u8),
    Reset(bool),
    Logout,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        prop::collection::vec(("[a-z]{1,8}", any::<bool>()), 0..6).prop_map(Step::Fetch),
        Just(Step::FetchFail),
        "[a-z ]{1,60}".prop_map(Step::Submit),
        (0usize..8).prop_map(Step::Mark),
        (0usize..8).prop_map(Step::Delete),
        (0u8..3).prop_map(Step::WriteFail),
        any::<bool>().prop_map(Step::Reset),
        Just(Step::Logout),
    ]
}

/// Actions the orchestrator would emit for `step` against `state`
fn actions_for(step: Step, state: &TodoState, next_id: &mut u64) -> Vec<TodoAction> {
    let mut fresh_id = || {
        *next_id += 1;
        EndpointId::new(format!("-id{next_id}"))
    };

    match step {
        Step::Fetch(items) => vec![
            TodoAction::FetchTodoStart,
            TodoAction::FetchTodoSuccess {
                todos: items
                    .into_iter()
                    .map(|(text, completed)| {
                        let mut item = TodoItem::new(text);
                        item.completed = completed;
                        TodoEntry::new(fresh_id(), item)
                    })
                    .collect(),
            },
        ],
        Step::FetchFail => vec![
            TodoAction::FetchTodoStart,
            TodoAction::FetchTodoFail {
                error: "request failed".to_string(),
            },
        ],
        Step::Submit(text) => vec![
            TodoAction::SubmitTodoStart,
            TodoAction::SubmitTodoSuccess {
                new_todo: TodoItem::new(text),
                new_endpoint: fresh_id(),
            },
        ],
        Step::Mark(index) => vec![
            TodoAction::MarkAsCompletedStart,
            TodoAction::MarkAsCompletedSuccess { index },
        ],
        Step::Delete(index) => {
            let mut old_todos = state.todos.clone();
            if index < old_todos.len() {
                old_todos.remove(index);
            }
            vec![
                TodoAction::DeleteTodoStart,
                TodoAction::DeleteTodoSuccess { old_todos, index },
            ]
        },
        Step::WriteFail(kind) => {
            let error = "random error".to_string();
            match kind {
                0 => vec![TodoAction::SubmitTodoStart, TodoAction::SubmitTodoFail { error }],
                1 => vec![
                    TodoAction::MarkAsCompletedStart,
                    TodoAction::MarkAsCompletedFail { error },
                ],
                _ => vec![TodoAction::DeleteTodoStart, TodoAction::DeleteTodoFail { error }],
            }
        },
        Step::Reset(fetch) => vec![TodoAction::ResetError {
            error_type: if fetch {
                ErrorField::FetchTodoError
            } else {
                ErrorField::SubmitCompleteDeleteTodoError
            },
        }],
        Step::Logout => vec![TodoAction::LogoutUserData],
    }
}

proptest! {
    #[test]
    fn items_and_endpoints_stay_aligned(steps in prop::collection::vec(step(), 0..40)) {
        let reducer = TodoReducer::<InMemoryPersistence>::new();
        let env = TodoEnvironment::new(InMemoryPersistence::new(), AuthSession::new());
        let mut state = TodoState::new();
        let mut next_id = 0;

        for step in steps {
            for action in actions_for(step, &state, &mut next_id) {
                let effects = reducer.reduce(&mut state, action, &env);
                prop_assert!(effects.is_empty());
                prop_assert_eq!(state.todos.len(), state.endpoints_arr.len());
            }
            prop_assert!(!state.loading);
            prop_assert!(state.deleted_todos.is_none());
        }
    }

    #[test]
    fn unknown_actions_never_change_state(
        steps in prop::collection::vec(step(), 0..10),
        kind in "[A-Z_]{3,20}",
    ) {
        let reducer = TodoReducer::<InMemoryPersistence>::new();
        let env = TodoEnvironment::new(InMemoryPersistence::new(), AuthSession::new());
        let mut state = TodoState::new();
        let mut next_id = 0;
        for step in steps {
            for action in actions_for(step, &state, &mut next_id) {
                reducer.reduce(&mut state, action, &env);
            }
        }

        let json = serde_json::json!({ "type": format!("X_{kind}") });
        let action: TodoAction = serde_json::from_value(json).unwrap();
        let before = state.clone();
        reducer.reduce(&mut state, action, &env);
        prop_assert_eq!(state, before);
    }
}
