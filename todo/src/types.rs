//! Domain types for the to-do list.
//!
//! Items are addressed positionally: `todos[i]` is stored remotely under
//! `endpoints_arr[i]`. Every stable state keeps the two sequences the same
//! length.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single to-do item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoItem {
    /// Item text
    #[serde(rename = "todo")]
    pub text: String,
    /// Whether the item has been marked as completed
    #[serde(default)]
    pub completed: bool,
    /// Reserved marker, carried through but never consulted
    #[serde(default)]
    pub delete: bool,
}

impl TodoItem {
    /// Creates a new open item
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
            delete: false,
        }
    }

    /// Returns a copy of this item with `completed` set
    #[must_use]
    pub fn as_completed(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }
}

/// Identifier the persistence layer assigned to a stored item
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// Wraps a raw identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Authentication token for remote operations
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identifier of the signed-in user
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps a raw user id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw user id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored item together with its endpoint id.
///
/// On the wire this is a single-key mapping: `{"<endpoint>": {..item..}}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoEntry {
    /// Endpoint id of the stored item
    pub endpoint: EndpointId,
    /// The stored item
    pub item: TodoItem,
}

impl TodoEntry {
    /// Pairs an endpoint id with its item
    #[must_use]
    pub const fn new(endpoint: EndpointId, item: TodoItem) -> Self {
        Self { endpoint, item }
    }
}

impl Serialize for TodoEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.endpoint, &self.item)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for TodoEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<EndpointId, TodoItem>::deserialize(deserializer)?;
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((endpoint, item)), None) => Ok(Self { endpoint, item }),
            _ => Err(de::Error::custom(
                "expected exactly one endpoint id mapped to one todo",
            )),
        }
    }
}

/// Splits fetched entries into the two parallel sequences the state keeps.
///
/// Order is preserved; an empty input yields two empty sequences.
#[must_use]
pub fn split_entries(entries: Vec<TodoEntry>) -> (Vec<TodoItem>, Vec<EndpointId>) {
    entries
        .into_iter()
        .map(|entry| (entry.item, entry.endpoint))
        .unzip()
}

/// The two independent error channels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorField {
    /// Errors from fetching the list
    FetchTodoError,
    /// Errors from submit, mark-as-completed and delete
    SubmitCompleteDeleteTodoError,
}

impl ErrorField {
    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FetchTodoError => "fetchTodoError",
            Self::SubmitCompleteDeleteTodoError => "submitCompleteDeleteTodoError",
        }
    }
}

impl fmt::Display for ErrorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four remote operation families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the full list
    Fetch,
    /// Persist one new item
    Submit,
    /// Mark one item as completed
    MarkAsCompleted,
    /// Delete one item
    Delete,
}

impl Operation {
    /// The error channel this operation reports failures on
    #[must_use]
    pub const fn error_field(self) -> ErrorField {
        match self {
            Self::Fetch => ErrorField::FetchTodoError,
            Self::Submit | Self::MarkAsCompleted | Self::Delete => {
                ErrorField::SubmitCompleteDeleteTodoError
            },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Submit => "submit",
            Self::MarkAsCompleted => "mark_as_completed",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// State of the to-do list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoState {
    /// Items, in display order
    pub todos: Vec<TodoItem>,
    /// Endpoint ids, index-aligned with `todos`
    pub endpoints_arr: Vec<EndpointId>,
    /// Reserved snapshot slot for a removed item; never written
    pub deleted_todos: Option<TodoItem>,
    /// An operation is in flight
    pub loading: bool,
    /// Last fetch failure (empty = no error)
    pub fetch_todo_error: String,
    /// Last write failure (empty = no error)
    pub submit_complete_delete_todo_error: String,
    /// The last write operation succeeded
    pub submit_todo_success: bool,
}

impl TodoState {
    /// Creates the initial (empty) state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `todos` and `endpoints_arr` have the same length
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.todos.len() == self.endpoints_arr.len()
    }

    /// Endpoint id of the item at `index`
    #[must_use]
    pub fn endpoint_at(&self, index: usize) -> Option<&EndpointId> {
        self.endpoints_arr.get(index)
    }

    /// Current message in the given error channel
    #[must_use]
    pub fn error(&self, field: ErrorField) -> &str {
        match field {
            ErrorField::FetchTodoError => &self.fetch_todo_error,
            ErrorField::SubmitCompleteDeleteTodoError => &self.submit_complete_delete_todo_error,
        }
    }

    pub(crate) fn error_mut(&mut self, field: ErrorField) -> &mut String {
        match field {
            ErrorField::FetchTodoError => &mut self.fetch_todo_error,
            ErrorField::SubmitCompleteDeleteTodoError => {
                &mut self.submit_complete_delete_todo_error
            },
        }
    }
}

/// Actions for the to-do store
///
/// The transition variants are the serialized action vocabulary:
/// `{"type": "FETCH_TODO_SUCCESS", "todos": [...]}`. Intents and
/// `OperationDiscarded` never leave the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TodoAction {
    // ========== Intents ==========
    /// Intent: fetch the remote list
    #[serde(skip)]
    FetchTodos {
        /// Credential for the remote call
        credential: Credential,
        /// Owner of the list
        user_id: UserId,
    },

    /// Intent: persist the last item of `todos` (the full intended list)
    #[serde(skip)]
    SubmitTodos {
        /// Owner of the list
        user_id: UserId,
        /// Existing items plus the new one at the end
        todos: Vec<TodoItem>,
        /// Credential for the remote call
        credential: Credential,
    },

    /// Intent: mark the item at `index` as completed
    #[serde(skip)]
    MarkAsCompleted {
        /// Endpoint id of the item
        endpoint: EndpointId,
        /// Position of the item
        index: usize,
        /// The item as currently shown
        todo: TodoItem,
        /// Credential for the remote call
        credential: Credential,
        /// Owner of the list
        user_id: UserId,
    },

    /// Intent: delete the item at `index`
    #[serde(skip)]
    DeleteTodo {
        /// Endpoint id of the item
        endpoint: EndpointId,
        /// Position of the item
        index: usize,
        /// The full current list
        todos: Vec<TodoItem>,
        /// Credential for the remote call
        credential: Credential,
        /// Owner of the list
        user_id: UserId,
    },

    // ========== Fetch ==========
    /// Fetch started
    FetchTodoStart,
    /// Fetch resolved with the remote entries, in order
    FetchTodoSuccess {
        /// Single-key mappings of endpoint id to item
        todos: Vec<TodoEntry>,
    },
    /// Fetch failed
    FetchTodoFail {
        /// Failure message
        error: String,
    },

    // ========== Submit ==========
    /// Submit started
    SubmitTodoStart,
    /// Submit persisted `new_todo` under `new_endpoint`
    SubmitTodoSuccess {
        /// The persisted item
        new_todo: TodoItem,
        /// Endpoint id assigned to it
        new_endpoint: EndpointId,
    },
    /// Submit failed
    SubmitTodoFail {
        /// Failure message
        error: String,
    },

    // ========== Mark as completed ==========
    /// Mark-as-completed started
    MarkAsCompletedStart,
    /// The item at `index` is now completed remotely
    MarkAsCompletedSuccess {
        /// Position of the item
        index: usize,
    },
    /// Mark-as-completed failed
    MarkAsCompletedFail {
        /// Failure message
        error: String,
    },

    // ========== Delete ==========
    /// Delete started
    DeleteTodoStart,
    /// The item at `index` was removed remotely
    DeleteTodoSuccess {
        /// The list after removal
        old_todos: Vec<TodoItem>,
        /// Position the item had
        index: usize,
    },
    /// Delete failed
    DeleteTodoFail {
        /// Failure message
        error: String,
    },

    // ========== Local ==========
    /// Clear one error channel
    ResetError {
        /// Channel to clear
        error_type: ErrorField,
    },
    /// Drop local list data after the credential went away
    LogoutUserData,

    /// An operation finished after its session ended; only clears `loading`
    #[serde(skip)]
    OperationDiscarded {
        /// The operation whose result was dropped
        operation: Operation,
    },

    /// Any unrecognized action type; leaves state unchanged
    #[serde(other)]
    Unknown,
}

impl TodoAction {
    /// Returns `true` if this action ends an in-flight `operation`
    #[must_use]
    pub fn is_terminal_for(&self, operation: Operation) -> bool {
        match self {
            Self::FetchTodoSuccess { .. } | Self::FetchTodoFail { .. } => {
                operation == Operation::Fetch
            },
            Self::SubmitTodoSuccess { .. } | Self::SubmitTodoFail { .. } => {
                operation == Operation::Submit
            },
            Self::MarkAsCompletedSuccess { .. } | Self::MarkAsCompletedFail { .. } => {
                operation == Operation::MarkAsCompleted
            },
            Self::DeleteTodoSuccess { .. } | Self::DeleteTodoFail { .. } => {
                operation == Operation::Delete
            },
            Self::OperationDiscarded { operation: discarded } => *discarded == operation,
            _ => false,
        }
    }

    /// Failure message carried by a FAIL transition
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::FetchTodoFail { error }
            | Self::SubmitTodoFail { error }
            | Self::MarkAsCompletedFail { error }
            | Self::DeleteTodoFail { error } => Some(error),
            _ => None,
        }
    }
}

/// Read model handed to the presentation layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoView {
    /// Items, in display order
    pub todos: Vec<TodoItem>,
    /// Endpoint ids, index-aligned with `todos`
    pub endpoints_arr: Vec<EndpointId>,
    /// An operation is in flight
    pub loading: bool,
    /// Last fetch failure (empty = no error)
    pub fetch_todo_error: String,
    /// Last write failure (empty = no error)
    pub submit_complete_delete_todo_error: String,
    /// The last write operation succeeded
    pub submit_todo_success: bool,
    /// Current credential, if signed in
    pub credential: Option<Credential>,
    /// Current user, if signed in
    pub user_id: Option<UserId>,
}

impl TodoView {
    /// Combines store state with the session identity
    #[must_use]
    pub fn new(state: &TodoState, credential: Option<Credential>, user_id: Option<UserId>) -> Self {
        Self {
            todos: state.todos.clone(),
            endpoints_arr: state.endpoints_arr.clone(),
            loading: state.loading,
            fetch_todo_error: state.fetch_todo_error.clone(),
            submit_complete_delete_todo_error: state.submit_complete_delete_todo_error.clone(),
            submit_todo_success: state.submit_todo_success,
            credential,
            user_id,
        }
    }
}
