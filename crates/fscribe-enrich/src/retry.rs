//! Retry policy with exponential backoff and cancellation.
//!
//! The retry bound and back-off schedule are explicit values invoked
//! imperatively around each external call site, so they are visible in the
//! code and testable. Back-off sleeps yield to the runtime rather than
//! busy-waiting, and the cancel flag is checked before every attempt.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Cooperative cancellation flag shared between a pipeline and its
/// in-flight operations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, un-cancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before the attempt following failure number `failures`.
    pub fn delay_after_failure(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(2u32.pow(exp));
        delay.min(self.max_delay)
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded.
    Success(T),
    /// All attempts failed; carries the final error.
    Exhausted { error: E, attempts: u32 },
    /// Cancellation was requested before an attempt.
    Cancelled,
}

impl<T, E> RetryOutcome<T, E> {
    /// Returns true if the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success(_))
    }
}

/// Execute an async operation with retries, backoff, and cancellation.
///
/// The cancel flag is checked before *every* attempt, including the first,
/// so a cancelled pipeline stops issuing external calls immediately.
pub async fn retry_with_cancel<F, Fut, T, E>(
    config: &RetryConfig,
    cancel: &CancelFlag,
    operation: F,
) -> RetryOutcome<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            debug!("{} cancelled before attempt {}", config.operation_name, failures + 1);
            return RetryOutcome::Cancelled;
        }

        match operation().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(e) => {
                failures += 1;
                if failures >= config.max_attempts {
                    warn!(
                        "{} failed after {} attempts: {}",
                        config.operation_name, failures, e
                    );
                    return RetryOutcome::Exhausted {
                        error: e,
                        attempts: failures,
                    };
                }

                let delay = config.delay_after_failure(failures);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, failures, delay, e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
