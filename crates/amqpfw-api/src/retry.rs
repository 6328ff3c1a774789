//! Retry-with-backoff decorator for [`FirewallApi`] implementations.
//!
//! The controller issues exactly one call per lifecycle step. Wrapping the
//! client in [`Retrying`] adds resilience against transient failures
//! (timeouts, connection errors, HTTP 429 and 5xx) without touching the
//! controller. Tests can use the bare client or [`RetryPolicy::disabled`].
//!
//! Read, update (a full replace) and delete are retried on any transient
//! failure. Create is only retried when the request never reached the
//! service (connection refused, rate limited), since a create that timed out
//! may already have been applied.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::warn;

use crate::error::Error;
use crate::firewall::FirewallApi;
use crate::types::RuleParams;

// ── RetryPolicy ──────────────────────────────────────────────────────

/// Exponential backoff configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,

    /// Delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,

    /// Upper bound on any single delay. Default: 10s.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Same backoff, different retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay schedule `min(initial * 2^n, max)`, without jitter or deadline.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build()
    }

    /// The server's `Retry-After` hint for a rate-limited call, capped at
    /// `max_delay`. It replaces the backoff delay for that retry.
    pub fn retry_after(&self, error: &Error) -> Option<Duration> {
        match error {
            Error::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs).min(self.max_delay))
            }
            _ => None,
        }
    }
}

// ── Retrying ─────────────────────────────────────────────────────────

/// Wraps any [`FirewallApi`] and retries transient failures.
#[derive(Debug, Clone)]
pub struct Retrying<A> {
    inner: A,
    policy: RetryPolicy,
}

impl<A> Retrying<A> {
    pub fn new(inner: A, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    /// Drive `call` through `backoff::future::retry_notify`.
    ///
    /// Failures matching `retryable` are transient until `max_retries`
    /// retries have been spent; everything else is permanent.
    async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        retryable: fn(&Error) -> bool,
        mut call: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let policy = &self.policy;
        let max_retries = policy.max_retries;
        let counter = AtomicU32::new(0);
        let attempts = &counter;

        let attempt = move || {
            let made = attempts.fetch_add(1, Ordering::SeqCst);
            let fut = call();
            async move {
                fut.await.map_err(|err| {
                    if made < max_retries && retryable(&err) {
                        let retry_after = policy.retry_after(&err);
                        backoff::Error::Transient { err, retry_after }
                    } else {
                        backoff::Error::Permanent(err)
                    }
                })
            }
        };

        let notify = move |err: Error, delay: Duration| {
            warn!(
                operation,
                attempt = attempts.load(Ordering::SeqCst),
                max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient API failure, retrying"
            );
        };

        backoff::future::retry_notify(policy.backoff(), attempt, notify).await
    }
}

impl<A: FirewallApi + Sync> FirewallApi for Retrying<A> {
    async fn create_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> Result<(), Error> {
        self.run("create", Error::is_unsent, || {
            self.inner.create_firewall_settings(instance_id, rules)
        })
        .await
    }

    async fn read_firewall_settings(&self, instance_id: i64) -> Result<Vec<RuleParams>, Error> {
        self.run("read", Error::is_transient, || self.inner.read_firewall_settings(instance_id))
            .await
    }

    async fn update_firewall_settings(
        &self,
        instance_id: i64,
        rules: &[RuleParams],
    ) -> Result<(), Error> {
        self.run("update", Error::is_transient, || {
            self.inner.update_firewall_settings(instance_id, rules)
        })
        .await
    }

    async fn delete_firewall_settings(&self, instance_id: i64) -> Result<(), Error> {
        self.run("delete", Error::is_transient, || self.inner.delete_firewall_settings(instance_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use backoff::backoff::Backoff;

    use super::*;

    /// The schedule is computed in floating point; allow sub-millisecond drift.
    fn assert_close(actual: Option<Duration>, expected: Duration) {
        let actual = actual.unwrap_or_default();
        let drift = actual.abs_diff(expected);
        assert!(
            drift < Duration::from_millis(1),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn disabled_policy_keeps_backoff_but_no_retries() {
        let policy = RetryPolicy::disabled();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.initial_delay, RetryPolicy::default().initial_delay);
    }

    #[test]
    fn backoff_doubles() {
        let mut backoff = RetryPolicy::default().backoff();
        assert_close(backoff.next_backoff(), Duration::from_millis(500));
        assert_close(backoff.next_backoff(), Duration::from_secs(1));
        assert_close(backoff.next_backoff(), Duration::from_secs(2));
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let mut backoff = RetryPolicy::default().backoff();
        for _ in 0..10 {
            backoff.next_backoff();
        }
        assert_close(backoff.next_backoff(), Duration::from_secs(10));
        assert_close(backoff.next_backoff(), Duration::from_secs(10));
    }

    #[test]
    fn rate_limit_honours_retry_after_within_cap() {
        let policy = RetryPolicy::default();
        let limited = Error::RateLimited {
            retry_after_secs: 4,
        };
        assert_eq!(policy.retry_after(&limited), Some(Duration::from_secs(4)));

        let long = Error::RateLimited {
            retry_after_secs: 600,
        };
        assert_eq!(policy.retry_after(&long), Some(Duration::from_secs(10)));

        let timeout = Error::Timeout { timeout_secs: 30 };
        assert_eq!(policy.retry_after(&timeout), None);
    }
}
