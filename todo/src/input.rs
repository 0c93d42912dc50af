//! Limits applied where text is collected, before anything is dispatched.
//!
//! The list holds at most five items and an item's text is at most sixty
//! characters. Neither limit is enforced by the reducer; a submission that
//! breaks one never becomes an action.

use crate::types::TodoItem;
use thiserror::Error;

/// Why a submission was not dispatched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Nothing was typed
    #[error("Please enter a todo")]
    EmptyText,

    /// The list is already full
    #[error("You can only have {max} todos")]
    TooManyTodos {
        /// The configured maximum
        max: usize,
    },
}

/// Bounds for the list and its items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionPolicy {
    /// Maximum number of items in the list
    pub max_todos: usize,
    /// Maximum item text length, in characters
    pub max_text_len: usize,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            max_todos: 5,
            max_text_len: 60,
        }
    }
}

impl SubmissionPolicy {
    /// Keep at most `max_text_len` characters of `text`
    #[must_use]
    pub fn clamp_text(&self, text: &str) -> String {
        text.chars().take(self.max_text_len).collect()
    }

    /// Build the full intended list for a submission.
    ///
    /// Returns the existing items followed by a new, not completed item.
    ///
    /// # Errors
    ///
    /// - [`SubmitRejection::EmptyText`] if `text` is empty
    /// - [`SubmitRejection::TooManyTodos`] if `todos` already holds `max_todos` items
    pub fn prepare_submission(
        &self,
        todos: &[TodoItem],
        text: &str,
    ) -> Result<Vec<TodoItem>, SubmitRejection> {
        if text.is_empty() {
            return Err(SubmitRejection::EmptyText);
        }
        if todos.len() >= self.max_todos {
            return Err(SubmitRejection::TooManyTodos {
                max: self.max_todos,
            });
        }

        let mut intended = todos.to_vec();
        intended.push(TodoItem::new(self.clamp_text(text)));
        Ok(intended)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<TodoItem> {
        (1..=n).map(|i| TodoItem::new(i.to_string())).collect()
    }

    #[test]
    fn clamps_by_characters_not_bytes() {
        let policy = SubmissionPolicy::default();
        let long = "é".repeat(80);

        let clamped = policy.clamp_text(&long);
        assert_eq!(clamped.chars().count(), 60);
        assert_eq!(policy.clamp_text("short"), "short");
    }

    #[test]
    fn empty_text_is_rejected() {
        let policy = SubmissionPolicy::default();
        assert_eq!(
            policy.prepare_submission(&items(2), ""),
            Err(SubmitRejection::EmptyText)
        );
    }

    #[test]
    fn fifth_item_is_accepted_sixth_is_not() {
        let policy = SubmissionPolicy::default();

        let intended = policy.prepare_submission(&items(4), "five").unwrap();
        assert_eq!(intended.len(), 5);
        assert_eq!(intended[4], TodoItem::new("five"));

        assert_eq!(
            policy.prepare_submission(&items(5), "six"),
            Err(SubmitRejection::TooManyTodos { max: 5 })
        );
    }

    #[test]
    fn submitted_text_is_clamped() {
        let policy = SubmissionPolicy {
            max_todos: 5,
            max_text_len: 3,
        };
        let intended = policy.prepare_submission(&[], "abcdef").unwrap();
        assert_eq!(intended, vec![TodoItem::new("abc")]);
    }
}
