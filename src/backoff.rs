// Author: Jacques Murray

//! Defines the `Backoff` trait and built-in backoff strategies.
//!
//! A `Backoff` maps the 1-based index of the attempt that just failed to the
//! delay before the next attempt. Strategies are pure: the same index always
//! yields the same delay, so one strategy can be shared by concurrent retries.

use std::time::Duration;

/// Trait for backoff strategies.
///
/// Any `Fn(i64) -> Duration` is a `Backoff`, so a closure can stand in for
/// the built-in strategies:
///
/// ```rust
/// use cancellable_retry::Backoff;
/// use std::time::Duration;
///
/// let capped_square = |attempt: i64| Duration::from_millis((attempt * attempt).clamp(0, 1_000) as u64);
/// assert_eq!(capped_square.delay(3), Duration::from_millis(9));
/// ```
pub trait Backoff {
    /// Returns the delay to wait after `attempt` has failed.
    ///
    /// `attempt` may be zero or negative when a strategy is called directly;
    /// the retry loop itself only passes values starting at 1.
    fn delay(&self, attempt: i64) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(i64) -> Duration,
{
    fn delay(&self, attempt: i64) -> Duration {
        self(attempt)
    }
}

// --- Constant Strategy ---

/// A backoff strategy that always waits for the same duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantBackoff {
    duration: Duration,
}

impl ConstantBackoff {
    /// Creates a new `ConstantBackoff` strategy.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Backoff for ConstantBackoff {
    fn delay(&self, _attempt: i64) -> Duration {
        self.duration
    }
}

// --- Linear Strategy ---

/// A backoff strategy that grows by `step` with every attempt.
///
/// Example with a 500ms step: 500ms, 1s, 1.5s, 2s...
///
/// Attempts at or below zero always map to a zero delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    step: Duration,
    max_delay: Option<Duration>,
}

impl LinearBackoff {
    /// Creates a new `LinearBackoff` strategy.
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            max_delay: None,
        }
    }

    /// Sets an optional maximum delay.
    /// The backoff will not increase beyond this duration.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }
}

impl Backoff for LinearBackoff {
    fn delay(&self, attempt: i64) -> Duration {
        if attempt <= 0 {
            return Duration::ZERO;
        }
        // saturating_mul to prevent a panic on overflow.
        let nanos = self
            .step
            .as_nanos()
            .saturating_mul(u128::from(attempt.unsigned_abs()));
        cap(nanos_to_duration(nanos), self.max_delay)
    }
}

// --- Exponential Strategy ---

/// A backoff strategy computing `base × factor × attempt`.
///
/// Note that the growth is linear in the attempt index: `factor` scales the
/// base once, it is not raised to the power of `attempt`. With a 500ms base
/// and a factor of 2 the delays are 1s, 2s, 3s...
///
/// The product is computed in nanoseconds and truncated. A product that is
/// not positive (zero base, negative factor or attempt) yields a zero delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base: Duration,
    factor: f64,
    max_delay: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates a new `ExponentialBackoff` strategy.
    ///
    /// - `base`: The unit delay (e.g., 500ms).
    /// - `factor`: The multiplier applied to `base` (e.g., 2.0).
    pub fn new(base: Duration, factor: f64) -> Self {
        Self {
            base,
            factor,
            max_delay: None,
        }
    }

    /// Sets an optional maximum delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: i64) -> Duration {
        let nanos = self.base.as_nanos() as f64 * self.factor * attempt as f64;
        let delay = if nanos.is_nan() || nanos <= 0.0 {
            Duration::ZERO
        } else {
            // `as` saturates, and truncates the fractional nanosecond.
            nanos_to_duration(nanos as u128)
        };
        cap(delay, self.max_delay)
    }
}

/// Converts nanoseconds to a `Duration`, saturating at `Duration::MAX`.
fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    match u64::try_from(nanos / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

fn cap(delay: Duration, max_delay: Option<Duration>) -> Duration {
    match max_delay {
        Some(max_delay) => delay.min(max_delay),
        None => delay,
    }
}
