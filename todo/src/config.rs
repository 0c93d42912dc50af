//! Configuration management for the to-do list.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::input::SubmissionPolicy;
use crate::types::{Credential, UserId};
use std::env;
use std::time::Duration;
use todo_store_runtime::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote persistence configuration
    pub backend: BackendConfig,
    /// List limits
    pub limits: LimitsConfig,
    /// Timeouts and retries
    pub timing: TimingConfig,
    /// Expose Prometheus metrics
    pub metrics_enabled: bool,
}

/// Remote persistence configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Realtime-database base URL (`None` = in-memory persistence)
    pub url: Option<String>,
    /// Token for the signed-in user
    pub credential: Option<String>,
    /// The signed-in user
    pub user_id: Option<String>,
}

/// List limits applied before submission
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum number of items (default: 5)
    pub max_todos: usize,
    /// Maximum item text length in characters (default: 60)
    pub max_text_len: usize,
}

/// Timeouts and retries
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// How long a client operation waits for its result, in seconds (default: 10).
    ///
    /// Raised to the transport's worst case when that is longer.
    pub operation_timeout_secs: u64,
    /// Per-request HTTP timeout in seconds (default: 15)
    pub request_timeout_secs: u64,
    /// Retries for transient transport failures (default: 3)
    pub retry_max: usize,
    /// First retry delay in milliseconds (default: 100)
    pub retry_initial_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            backend: BackendConfig {
                url: env::var("TODO_BACKEND_URL").ok().filter(|s| !s.is_empty()),
                credential: env::var("TODO_CREDENTIAL").ok().filter(|s| !s.is_empty()),
                user_id: env::var("TODO_USER_ID").ok().filter(|s| !s.is_empty()),
            },
            limits: LimitsConfig {
                max_todos: env::var("TODO_MAX_TODOS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                max_text_len: env::var("TODO_MAX_TEXT_LEN")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
            timing: TimingConfig {
                operation_timeout_secs: env::var("TODO_OPERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                request_timeout_secs: env::var("TODO_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
                retry_max: env::var("TODO_RETRY_MAX")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                retry_initial_delay_ms: env::var("TODO_RETRY_INITIAL_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
            },
            metrics_enabled: env_flag("TODO_METRICS_ENABLED").unwrap_or(false),
        }
    }

    /// Retry policy for the HTTP transport
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.timing.retry_max)
            .initial_delay(Duration::from_millis(self.timing.retry_initial_delay_ms))
            .build()
    }

    /// How long a client operation waits for its terminal action.
    ///
    /// Never shorter than [`Config::transport_budget`], so a slow but
    /// successful request is not reported as a timeout.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.operation_timeout_secs).max(self.transport_budget())
    }

    /// Worst case for one HTTP operation: every attempt runs into the request
    /// timeout and every backoff delay is slept.
    #[must_use]
    pub fn transport_budget(&self) -> Duration {
        let policy = self.retry_policy();
        let attempts = u32::try_from(policy.max_retries.saturating_add(1)).unwrap_or(u32::MAX);

        let mut backoff = Duration::ZERO;
        for attempt in 0..policy.max_retries {
            let delay = policy.delay_for_attempt(attempt);
            if delay >= policy.max_delay {
                // Capped from here on
                let remaining = u32::try_from(policy.max_retries - attempt).unwrap_or(u32::MAX);
                backoff = backoff.saturating_add(policy.max_delay.saturating_mul(remaining));
                break;
            }
            backoff = backoff.saturating_add(delay);
        }

        self.request_timeout()
            .saturating_mul(attempts)
            .saturating_add(backoff)
            .saturating_add(TRANSPORT_SLACK)
    }

    /// Per-request HTTP timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.request_timeout_secs)
    }

    /// Limits for [`SubmissionPolicy`]
    #[must_use]
    pub const fn submission_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy {
            max_todos: self.limits.max_todos,
            max_text_len: self.limits.max_text_len,
        }
    }

    /// Configured credential and user id, when both are set
    #[must_use]
    pub fn identity(&self) -> Option<(Credential, UserId)> {
        match (&self.backend.credential, &self.backend.user_id) {
            (Some(credential), Some(user_id)) => {
                Some((Credential::new(credential.as_str()), UserId::new(user_id.as_str())))
            },
            _ => None,
        }
    }
}

/// Headroom for reducing and broadcasting around the remote call
const TRANSPORT_SLACK: Duration = Duration::from_secs(1);

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|s| parse_flag(&s))
}

/// Parses `1/true/yes/on` and `0/false/no/off`, ignoring case
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: None,
                credential: None,
                user_id: None,
            },
            limits: LimitsConfig {
                max_todos: 5,
                max_text_len: 60,
            },
            timing: TimingConfig {
                operation_timeout_secs: 10,
                request_timeout_secs: 15,
                retry_max: 3,
                retry_initial_delay_ms: 100,
            },
            metrics_enabled: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_list_limits() {
        let config = Config::default();
        assert_eq!(config.submission_policy(), SubmissionPolicy::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.identity().is_none());
    }

    #[test]
    fn retry_policy_uses_configured_values() {
        let mut config = Config::default();
        config.timing.retry_max = 1;
        config.timing.retry_initial_delay_ms = 250;

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
    }

    #[test]
    fn default_operation_timeout_outlasts_every_retry() {
        let config = Config::default();

        // Four attempts of 15s each, plus 100ms + 200ms + 400ms of backoff
        assert!(config.operation_timeout() >= config.request_timeout() * 4);
        assert_eq!(
            config.transport_budget(),
            Duration::from_secs(60) + Duration::from_millis(700) + TRANSPORT_SLACK
        );
        assert_eq!(config.operation_timeout(), config.transport_budget());
    }

    #[test]
    fn longer_configured_operation_timeout_is_kept() {
        let mut config = Config::default();
        config.timing.operation_timeout_secs = 600;
        assert_eq!(config.operation_timeout(), Duration::from_secs(600));

        config.timing.operation_timeout_secs = 1;
        config.timing.request_timeout_secs = 2;
        config.timing.retry_max = 0;
        assert_eq!(config.operation_timeout(), Duration::from_secs(2) + TRANSPORT_SLACK);
    }

    #[test]
    fn backoff_past_the_cap_is_counted_at_the_cap() {
        let mut config = Config::default();
        config.timing.request_timeout_secs = 1;
        config.timing.retry_max = 10;
        config.timing.retry_initial_delay_ms = 1_000;

        // 1s, 2s, 4s, then seven delays capped at 5s
        let backoff = Duration::from_secs(1 + 2 + 4 + 7 * 5);
        assert_eq!(
            config.transport_budget(),
            Duration::from_secs(11) + backoff + TRANSPORT_SLACK
        );
    }

    #[test]
    fn flags_accept_common_spellings() {
        for value in ["1", "true", "TRUE", "yes", "On", " true "] {
            assert_eq!(parse_flag(value), Some(true), "{value}");
        }
        for value in ["0", "false", "False", "no", "off"] {
            assert_eq!(parse_flag(value), Some(false), "{value}");
        }
        assert_eq!(parse_flag("enabled"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn identity_requires_both_parts() {
        let mut config = Config::default();
        config.backend.credential = Some("token".to_string());
        assert!(config.identity().is_none());

        config.backend.user_id = Some("user-1".to_string());
        let (credential, user_id) = config.identity().unwrap();
        assert_eq!(credential.expose(), "token");
        assert_eq!(user_id.as_str(), "user-1");
    }
}
