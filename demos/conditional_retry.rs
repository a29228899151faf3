// Author: Jacques Murray

mod common;

use cancellable_retry::{CancelToken, Cancelled, ExponentialBackoff, Retry, Signal};
use common::{should_retry_api_error, ApiError};
use std::time::Duration;

/// A mock API fetcher.
/// We use `httpstat.us` to force specific HTTP error codes.
///
/// The request itself watches the token, so a deadline aborts it mid-flight.
async fn fetch_important_data(token: CancelToken, status_code: u16) -> Result<String, ApiError> {
    let url = format!("https://httpstat.us/{}", status_code);
    println!("Fetching {}...", url);

    let request = async {
        let res = reqwest::get(&url).await?;
        let status = res.status();
        let text = res.text().await?;
        Ok::<_, ApiError>((status, text))
    };

    let (status, text) = tokio::select! {
        response = request => response?,
        () = token.done() => {
            let reason = token.reason().unwrap_or(Cancelled::Canceled);
            return Err(ApiError::Aborted(reason));
        }
    };

    match status {
        s if s.is_success() => Ok(text),
        s if s.is_client_error() => Err(ApiError::ClientError(format!("{}: {}", s, text))),
        s if s.is_server_error() => Err(ApiError::ServerError(format!("{}: {}", s, text))),
        _ => Err(ApiError::ServerError("Unknown error".to_string())),
    }
}

async fn run_demo(code: u16, desc: &str) {
    println!("\n--- Running Conditional Retry: {} ({}) ---", desc, code);

    // The whole call, retries included, gets 5 seconds.
    let token = CancelToken::with_timeout(Duration::from_secs(5));

    // 200ms * 2 * attempt: 400ms, 800ms, ...
    let strategy = ExponentialBackoff::new(Duration::from_millis(200), 2.0);

    // The operation closure captures the status code
    let operation = move |token| fetch_important_data(token, code);

    let result = Retry::new(token, operation)
        .with_max_attempts(3)
        .with_backoff(strategy)
        .with_condition(should_retry_api_error) // Use our custom condition
        .await;

    match result {
        Ok(data) => println!("Success: {}", data),
        Err(e) => println!("Failed: {}", e),
    }
}

#[tokio::main]
async fn main() {
    // 1. Test server error (should retry and fail)
    // 503 Service Unavailable is retryable
    run_demo(503, "Server Error (503)").await;

    // 2. Test client error (should fail immediately)
    // 404 Not Found is NOT retryable
    run_demo(404, "Client Error (404)").await;
}
