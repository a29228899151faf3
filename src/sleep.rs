// Author: Jacques Murray

//! Provides runtime-agnostic timers.
//!
//! This module uses feature flags (`tokio-timer`, `async-std-timer`)
//! to determine which runtime's timer to use.

use std::time::{Duration, Instant};

/// Sleeps for the specified duration, using the async runtime
/// selected by the crate's feature flags.
///
/// Will produce a compile error if no timer feature is enabled.
pub async fn sleep(duration: Duration) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "tokio-timer")] {
            tokio::time::sleep(duration).await;
        } else if #[cfg(feature = "async-std-timer")] {
            async_std::task::sleep(duration).await;
        } else {
            // Forces the user to pick a runtime.
            compile_error!("No async timer feature enabled. Please enable 'tokio-timer' or 'async-std-timer'.");
        }
    }
}

/// Sleeps until `deadline`. Resolves immediately if it has already passed.
pub async fn sleep_until(deadline: Instant) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "tokio-timer")] {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        } else {
            sleep(deadline.saturating_duration_since(Instant::now())).await;
        }
    }
}
