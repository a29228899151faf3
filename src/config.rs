// Author: Jacques Murray

//! The retry policy: how many attempts, how long to wait, and which errors
//! are worth another try.

use crate::backoff::{Backoff, ConstantBackoff};
use crate::error::is_cancellation;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Attempts made when no override is given.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts when no override is given.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

type SharedBackoff = Arc<dyn Backoff + Send + Sync>;
type Condition<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A retry policy for operations failing with `E`.
///
/// Start from [`RetryConfig::default()`] and override fields with the
/// `with_*` methods. Each override replaces its field wholesale, and the last
/// one applied wins.
///
/// Cloning is cheap and clones share the strategy and condition, so one
/// policy can be reused by concurrent retry loops.
pub struct RetryConfig<E> {
    max_attempts: u32,
    backoff: SharedBackoff,
    condition: Condition<E>,
}

/// Retries every error except a cancellation.
fn default_condition<E: Error + 'static>(e: &E) -> bool {
    !is_cancellation(e)
}

impl<E> Default for RetryConfig<E>
where
    E: Error + 'static,
{
    /// 3 attempts, 500ms between them, retrying anything but cancellation.
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Arc::new(ConstantBackoff::new(DEFAULT_DELAY)),
            condition: Arc::new(default_condition::<E>),
        }
    }
}

impl<E> RetryConfig<E> {
    /// Sets the maximum number of attempts, including the first one.
    ///
    /// A value of 0 is raised to 1: the operation always runs at least once.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replaces the backoff strategy.
    pub fn with_backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + Send + Sync + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Replaces the retry condition.
    ///
    /// The closure `condition` receives a reference to the error `&E` and
    /// must return `true` if a retry should be attempted, or `false`
    /// if the loop should give up and return the error.
    ///
    /// This replaces the default condition entirely, including its refusal
    /// to retry cancellation.
    pub fn with_retry_if<C>(mut self, condition: C) -> Self
    where
        C: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.condition = Arc::new(condition);
        self
    }

    /// The maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay to wait after `attempt` has failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(i64::from(attempt))
    }

    /// Whether `error` should be retried.
    pub fn should_retry(&self, error: &E) -> bool {
        (self.condition)(error)
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: Arc::clone(&self.backoff),
            condition: Arc::clone(&self.condition),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::LinearBackoff;
    use crate::error::Cancelled;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("boom")]
        Boom,
        #[error("aborted")]
        Aborted(#[source] Cancelled),
    }

    #[test]
    fn test_defaults() {
        let config = RetryConfig::<TestError>::default();
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.delay(1), Duration::from_millis(500));
        assert_eq!(config.delay(7), Duration::from_millis(500));
        assert!(config.should_retry(&TestError::Boom));
    }

    #[test]
    fn test_default_condition_refuses_cancellation() {
        let config = RetryConfig::<Cancelled>::default();
        assert!(!config.should_retry(&Cancelled::Canceled));
        assert!(!config.should_retry(&Cancelled::DeadlineExceeded));

        let config = RetryConfig::<TestError>::default();
        assert!(!config.should_retry(&TestError::Aborted(Cancelled::DeadlineExceeded)));
    }

    #[test]
    fn test_overrides_replace_fields() {
        let config = RetryConfig::<TestError>::default()
            .with_max_attempts(5)
            .with_backoff(LinearBackoff::new(Duration::from_millis(10)))
            .with_retry_if(|e| matches!(e, TestError::Aborted(_)));

        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.delay(3), Duration::from_millis(30));
        assert!(!config.should_retry(&TestError::Boom));
        assert!(config.should_retry(&TestError::Aborted(Cancelled::Canceled)));
    }

    #[test]
    fn test_last_override_wins() {
        let config = RetryConfig::<TestError>::default()
            .with_max_attempts(2)
            .with_backoff(|_: i64| Duration::from_secs(1))
            .with_max_attempts(7)
            .with_backoff(|attempt: i64| Duration::from_millis(attempt as u64));

        assert_eq!(config.max_attempts(), 7);
        assert_eq!(config.delay(4), Duration::from_millis(4));
    }

    #[test]
    fn test_zero_max_attempts_is_clamped() {
        let config = RetryConfig::<TestError>::default().with_max_attempts(0);
        assert_eq!(config.max_attempts(), 1);
    }

    #[test]
    fn test_clones_share_policy() {
        let config = RetryConfig::<TestError>::default().with_retry_if(|_| false);
        let clone = config.clone();
        assert!(!clone.should_retry(&TestError::Boom));
        assert_eq!(format!("{:?}", clone), "RetryConfig { max_attempts: 3, .. }");
    }
}
