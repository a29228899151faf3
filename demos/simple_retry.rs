// Author: Jacques Murray

use cancellable_retry::{execute, CancelToken, LinearBackoff, RetryConfig};
use std::time::{Duration, Instant};
use thiserror::Error;

// Define a proper error type
#[derive(Debug, Error)]
#[error("Operation failed: {message}")]
struct OperationError {
    message: String,
}

// A mock function that will fail 3 times before succeeding.
async fn flaky_operation(_token: CancelToken) -> Result<String, OperationError> {
    // Use a static to track attempts across calls
    static ATTEMPTS: tokio::sync::Mutex<u32> = tokio::sync::Mutex::const_new(0);

    let mut attempts = ATTEMPTS.lock().await;
    *attempts += 1;

    println!("Attempt {}: Trying operation...", *attempts);

    if *attempts <= 3 {
        println!("Attempt {}: Failed.", *attempts);
        Err(OperationError {
            message: format!("Failed on attempt {}", *attempts),
        })
    } else {
        println!("Attempt {}: Succeeded.", *attempts);
        Ok("Got the data!".to_string())
    }
}

#[tokio::main]
async fn main() {
    println!("--- Running Simple Retry Demo ---");

    // 100ms, 200ms, 300ms, ... between 5 total attempts
    let config = RetryConfig::default()
        .with_max_attempts(5)
        .with_backoff(LinearBackoff::new(Duration::from_millis(100)));

    let start = Instant::now();

    let result = execute(CancelToken::new(), flaky_operation, config).await;

    println!("\n--- Result ---");
    match result {
        Ok(data) => println!("Success: {}", data),
        Err(e) => println!("Failed: {}", e),
    }
    println!("Total time: {:?}", start.elapsed());
}
