// Author: Jacques Murray

//! # cancellable-retry
//!
//! A library to retry fallible asynchronous operations under a pluggable
//! policy, while cooperating with an external cancellation signal.
//!
//! ## Goals
//!
//! * Three independent policy axes: attempt budget, backoff strategy and
//!   retry condition, each replaceable on its own.
//! * Deterministic backoff strategies (Constant, Linear, Exponential), or
//!   any `Fn(i64) -> Duration`.
//! * Cancellation and deadlines preempt the loop before an attempt, during
//!   an attempt and during a backoff wait.
//! * Be runtime-agnostic (supports Tokio and async-std via feature flags).
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cancellable-retry = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! `tokio-timer` is enabled by default. For async-std use
//! `default-features = false, features = ["async-std-timer"]`.
//!
//! ### Example: Simple Retry
//!
//! ```rust,no_run
//! use cancellable_retry::{CancelToken, ExponentialBackoff, Retry};
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("failed to connect")]
//! struct ConnectError;
//!
//! async fn fetch_data() -> Result<String, ConnectError> {
//!     // ... logic that might fail
//!     Err(ConnectError)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let token = CancelToken::with_timeout(Duration::from_secs(5));
//!
//!     let result = Retry::new(token, |_token| fetch_data())
//!         .with_max_attempts(5)
//!         .with_backoff(ExponentialBackoff::new(Duration::from_millis(100), 2.0))
//!         .await;
//!
//!     match result {
//!         Ok(data) => println!("Succeeded: {}", data),
//!         Err(e) => println!("Failed: {}", e),
//!     }
//! }
//! ```
//!
//! ### Example: Conditional Retry
//!
//! ```rust,no_run
//! use cancellable_retry::{execute, CancelToken, RetryConfig, RetryError};
//!
//! #[derive(Debug, thiserror::Error)]
//! enum MyError {
//!     #[error("transient network error")]
//!     TransientNetworkError,
//!     #[error("permanent auth error")]
//!     PermanentAuthError,
//! }
//!
//! async fn fetch_sensitive_data(_token: CancelToken) -> Result<String, MyError> {
//!     // ...
//!     Err(MyError::TransientNetworkError)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Only retry on transient errors
//!     let config = RetryConfig::default()
//!         .with_retry_if(|e: &MyError| matches!(e, MyError::TransientNetworkError));
//!
//!     let result = execute(CancelToken::new(), fetch_sensitive_data, config).await;
//!
//!     if let Err(RetryError::Operation(MyError::PermanentAuthError)) = result {
//!         println!("Failed immediately due to auth error.");
//!     }
//! }
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod signal;
mod sleep;

// Public re-exports for easier use
pub use backoff::{Backoff, ConstantBackoff, ExponentialBackoff, LinearBackoff};
pub use config::RetryConfig;
pub use error::{is_cancellation, Cancelled, RetryError};
pub use signal::{CancelToken, Signal};

use futures_util::future::{self, Either};
use std::error::Error;
use std::future::{Future, IntoFuture};
use std::pin::{pin, Pin};

/// Runs `operation` until it succeeds, the policy gives up, or `signal`
/// fires.
///
/// Each attempt receives a clone of `signal` so the operation can abort on
/// its own. Returns the first success, [`RetryError::Operation`] with the
/// last error when the condition rejects it or the attempt budget runs out,
/// or [`RetryError::Cancelled`] with the signal's reason.
///
/// If the signal fires while an attempt is in flight, that attempt's future
/// is dropped.
pub async fn execute<S, O, F, T, E>(
    signal: S,
    mut operation: O,
    config: RetryConfig<E>,
) -> Result<T, RetryError<E>>
where
    S: Signal,
    O: FnMut(S) -> F,
    F: Future<Output = Result<T, E>>,
    E: Error,
{
    let max_attempts = config.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        if signal.is_done() {
            #[cfg(feature = "logging")]
            log::error!("Retry cancelled before attempt {}.", attempt);
            return Err(cancelled(&signal));
        }

        #[cfg(feature = "logging")]
        log::trace!("Starting attempt {} of {}", attempt, max_attempts);

        let result = {
            let call = pin!(operation(signal.clone()));
            match future::select(call, signal.done()).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => {
                    #[cfg(feature = "logging")]
                    log::error!("Retry cancelled during attempt {}.", attempt);
                    return Err(cancelled(&signal));
                }
            }
        };

        let e = match result {
            Ok(value) => {
                #[cfg(feature = "logging")]
                log::trace!("Operation succeeded on attempt {}", attempt);
                return Ok(value);
            }
            Err(e) => e,
        };

        #[cfg(feature = "logging")]
        log::warn!("Operation failed on attempt {} with error: {}", attempt, e);

        if !config.should_retry(&e) {
            #[cfg(feature = "logging")]
            log::error!("Retry failed: error is not retryable.");
            return Err(RetryError::Operation(e));
        }

        if attempt >= max_attempts {
            #[cfg(feature = "logging")]
            log::error!("Retry failed: gave up after {} attempts.", attempt);
            return Err(RetryError::Operation(e));
        }

        let delay = config.delay(attempt);
        if delay.is_zero() {
            continue;
        }

        #[cfg(feature = "logging")]
        log::debug!("Retrying after delay of {:?}", delay);

        let wait = pin!(sleep::sleep(delay));
        if let Either::Right(_) = future::select(wait, signal.done()).await {
            #[cfg(feature = "logging")]
            log::error!("Retry cancelled while waiting after attempt {}.", attempt);
            return Err(cancelled(&signal));
        }
    }
}

fn cancelled<S: Signal, E>(signal: &S) -> RetryError<E> {
    RetryError::Cancelled(signal.reason().unwrap_or(Cancelled::Canceled))
}

/// The builder struct for a retryable operation.
///
/// This struct is created by [`Retry::new()`] and configured using its
/// "builder" style methods like [`with_condition()`](Retry::with_condition)
/// and [`with_max_attempts()`](Retry::with_max_attempts).
///
/// It implements `IntoFuture`, so you can simply `.await` it.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Retry<S, O, E> {
    signal: S,
    operation: O,
    config: RetryConfig<E>,
}

impl<S, O, E> Retry<S, O, E>
where
    S: Signal,
    E: Error + 'static,
{
    /// Creates a new `Retry` instance with the default [`RetryConfig`].
    ///
    /// - `signal`: A [`Signal`] that stops the loop when it fires.
    /// - `operation`: A closure taking the signal and returning a `Future`
    ///   (e.g., `|token| async move { ... }`).
    ///
    /// By default, it makes 3 attempts 500ms apart and retries every error
    /// except cancellation.
    pub fn new<F, T>(signal: S, operation: O) -> Self
    where
        O: FnMut(S) -> F,
        F: Future<Output = Result<T, E>>,
    {
        Self {
            signal,
            operation,
            config: RetryConfig::default(),
        }
    }
}

impl<S, O, E> Retry<S, O, E> {
    /// Replaces the whole policy.
    pub fn with_config(mut self, config: RetryConfig<E>) -> Self {
        self.config = config;
        self
    }

    /// Sets the maximum number of attempts. See [`RetryConfig::with_max_attempts`].
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config = self.config.with_max_attempts(max_attempts);
        self
    }

    /// Replaces the backoff strategy.
    pub fn with_backoff<B>(mut self, backoff: B) -> Self
    where
        B: Backoff + Send + Sync + 'static,
    {
        self.config = self.config.with_backoff(backoff);
        self
    }

    /// Sets a new condition predicate for retrying.
    ///
    /// The closure `condition` receives a reference to the error `&E` and
    /// must return `true` if a retry should be attempted, or `false`
    /// if the loop should give up and return the error.
    pub fn with_condition<C>(mut self, condition: C) -> Self
    where
        C: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.config = self.config.with_retry_if(condition);
        self
    }
}

/// The core retry logic, implemented via `IntoFuture`.
///
/// This allows `Retry` to be `.await`ed directly.
impl<S, O, F, T, E> IntoFuture for Retry<S, O, E>
where
    S: Signal + 'static,
    O: FnMut(S) -> F + Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Error + Send + 'static,
{
    type Output = Result<T, RetryError<E>>;

    // We box the future to avoid complex type signatures in the return.
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'static>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(execute(self.signal, self.operation, self.config))
    }
}
