// Author: Jacques Murray

//! Cancellation signals observed by the retry loop.
//!
//! The loop never cancels anything itself. It checks [`Signal::is_done`]
//! before each attempt and races [`Signal::done`] against both the
//! operation and the backoff wait.

use crate::error::Cancelled;
use crate::sleep;
use futures_core::future::BoxFuture;
use futures_util::future;
use std::pin::pin;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// An externally owned exit condition for a retry loop.
///
/// Signals are cloned into every attempt, so clones must observe the same
/// state.
pub trait Signal: Clone + Send + Sync {
    /// Non-blocking check whether the signal has fired.
    fn is_done(&self) -> bool;

    /// Resolves once the signal has fired.
    fn done(&self) -> BoxFuture<'_, ()>;

    /// Why the signal fired, or `None` while it is still live.
    fn reason(&self) -> Option<Cancelled>;
}

/// A plain token only ever reports [`Cancelled::Canceled`].
impl Signal for CancellationToken {
    fn is_done(&self) -> bool {
        self.is_cancelled()
    }

    fn done(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.cancelled())
    }

    fn reason(&self) -> Option<Cancelled> {
        self.is_cancelled().then_some(Cancelled::Canceled)
    }
}

/// A cancellation token with an optional deadline.
///
/// Clones share state: cancelling any clone cancels them all. The reported
/// reason is whichever cause came first.
///
/// ```rust
/// use cancellable_retry::{CancelToken, Cancelled, Signal};
/// use std::time::Duration;
///
/// let token = CancelToken::with_timeout(Duration::from_secs(5));
/// assert!(!token.is_done());
///
/// token.clone().cancel();
/// assert_eq!(token.reason(), Some(Cancelled::Canceled));
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    token: CancellationToken,
    deadline: Option<Instant>,
    reason: Arc<OnceLock<Cancelled>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            reason: Arc::new(OnceLock::new()),
        }
    }
}

impl CancelToken {
    /// Creates a token that only fires when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that also fires once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    /// Creates a token that also fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            // Too far out to ever fire.
            None => Self::new(),
        }
    }

    /// Cancels the token and every clone of it.
    ///
    /// Has no effect on the reason if the token already fired.
    pub fn cancel(&self) {
        self.reason.get_or_init(|| {
            if self.deadline_passed() {
                Cancelled::DeadlineExceeded
            } else {
                Cancelled::Canceled
            }
        });
        self.token.cancel();
    }

    /// The deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Signal for CancelToken {
    fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline_passed()
    }

    fn done(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            match self.deadline {
                None => self.token.cancelled().await,
                Some(deadline) => {
                    let cancelled = pin!(self.token.cancelled());
                    let expired = pin!(sleep::sleep_until(deadline));
                    future::select(cancelled, expired).await;
                }
            }
        })
    }

    fn reason(&self) -> Option<Cancelled> {
        if let Some(reason) = self.reason.get() {
            return Some(*reason);
        }
        if self.deadline_passed() {
            return Some(*self.reason.get_or_init(|| Cancelled::DeadlineExceeded));
        }
        None
    }
}
