// Author: Jacques Murray

//! Error types returned by the retry loop.

use std::error::Error;
use thiserror::Error;

/// Why a cancellation signal is done.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cancelled {
    /// The signal was cancelled explicitly.
    #[error("operation canceled")]
    Canceled,

    /// The signal's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// The error returned by a retried operation.
///
/// There is no separate "gave up" variant: when the attempt budget runs out,
/// or the retry condition rejects an error, the last operation error is
/// returned verbatim as [`RetryError::Operation`].
#[derive(Debug, Error, PartialEq)]
pub enum RetryError<E> {
    /// The error produced by the last attempt.
    #[error(transparent)]
    Operation(E),

    /// The cancellation signal stopped the loop, before an attempt or
    /// during a call or a backoff wait.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl<E> RetryError<E> {
    /// Returns `true` if the loop was stopped by the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled(_))
    }

    /// Returns the operation error, if that is what stopped the loop.
    pub fn as_operation(&self) -> Option<&E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }

    /// Consumes the error, returning the operation error if there is one.
    pub fn into_operation(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            RetryError::Cancelled(_) => None,
        }
    }
}

/// Returns `true` if `err`, or any error in its `source()` chain, is a
/// [`Cancelled`].
///
/// This is what the default retry condition uses to refuse retrying
/// cancellation. An operation that wants its own error type recognised
/// should keep the `Cancelled` reachable as a source, e.g. with
/// `#[error("...")] Cancelled(#[source] Cancelled)`.
pub fn is_cancellation(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<Cancelled>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    enum FetchError {
        #[error("request aborted")]
        Aborted(#[source] Cancelled),
        #[error("connection reset")]
        Reset,
    }

    #[test]
    fn test_is_cancellation_direct() {
        assert!(is_cancellation(&Cancelled::Canceled));
        assert!(is_cancellation(&Cancelled::DeadlineExceeded));
    }

    #[test]
    fn test_is_cancellation_through_source_chain() {
        assert!(is_cancellation(&FetchError::Aborted(Cancelled::DeadlineExceeded)));
        assert!(!is_cancellation(&FetchError::Reset));
    }

    #[test]
    fn test_is_cancellation_of_retry_error() {
        let cancelled: RetryError<FetchError> = Cancelled::Canceled.into();
        // Transparent forwards `source()` past the `Cancelled` itself, so look at the variant.
        assert!(cancelled.is_cancelled());
        assert!(cancelled.as_operation().is_none());

        let failed = RetryError::Operation(FetchError::Reset);
        assert!(!failed.is_cancelled());
        assert!(matches!(failed.into_operation(), Some(FetchError::Reset)));
    }

    #[test]
    fn test_display_is_verbatim() {
        let err: RetryError<FetchError> = RetryError::Operation(FetchError::Reset);
        assert_eq!(err.to_string(), "connection reset");
        let err: RetryError<FetchError> = Cancelled::DeadlineExceeded.into();
        assert_eq!(err.to_string(), "deadline exceeded");
    }
}
