//! # Todo Store Testing
//!
//! Testing utilities and helpers for the reducer/effect architecture.
//!
//! This crate provides:
//! - [`ReducerTest`]: a Given-When-Then harness for reducers
//! - [`assertions`]: helpers for inspecting returned effects
//! - [`init_test_tracing`]: log output for tests, controlled by `RUST_LOG`
//!
//! ## Example
//!
//! ```ignore
//! use todo_store_testing::{ReducerTest, assertions};
//!
//! #[test]
//! fn fetch_start_sets_loading() {
//!     ReducerTest::new(TodoReducer::new())
//!         .with_env(test_environment())
//!         .given_state(TodoState::default())
//!         .when_action(TodoAction::FetchTodoStart)
//!         .then_state(|state| assert!(state.loading))
//!         .then_effects(assertions::assert_no_effects)
//!         .run();
//! }
//! ```

pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a `tracing` subscriber for tests.
///
/// Safe to call from every test; only the first call installs anything.
/// Output goes through the test writer so it is captured per test, and the
/// filter honors `RUST_LOG` (default `warn`).
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
