//! `retry-http` runs fallible operations with a bounded number of attempts
//! and linear backoff between failures.
//!
//! - [`RetryingCaller::execute`] retries any failing operation
//! - [`RetryingCaller::execute_classified`] lets the operation mark errors fatal
//! - [`HttpFetcher`] sends HTTP requests through a [`RetryingCaller`]
//!
//! ```no_run
//! use retry_http::{RetryConfig, RetryingCaller};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let caller = RetryingCaller::new(RetryConfig::new(3, 1_000));
//! let body = caller
//!     .execute(|| async { std::fs::read_to_string("/tmp/flaky") })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

mod caller;
mod client;
mod error;
mod options;
mod sleep;
mod types;

pub use caller::{execute, Attempt, RetryingCaller};
pub use client::HttpFetcher;
pub use error::{ConfigError, HttpError, RetryError};
pub use options::{Backoff, HttpOptions, RetryConfig};
pub use sleep::{Sleeper, TokioSleeper};
pub use types::{HttpRequest, HttpResponse};

/// Outcome of one retried call.
pub type CallResult<T, E> = std::result::Result<T, RetryError<E>>;
