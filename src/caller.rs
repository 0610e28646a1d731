use std::future::Future;

use crate::{CallResult, ConfigError, RetryConfig, RetryError, Sleeper, TokioSleeper};

/// Outcome tag for a failed attempt, used by
/// [`RetryingCaller::execute_classified`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Attempt<E> {
    /// Another attempt may be made while the budget lasts.
    Retryable(E),
    /// Stop immediately and report this error.
    Fatal(E),
}

impl<E> Attempt<E> {
    /// Tags `error` as retryable when `is_retryable` says so, fatal otherwise.
    pub fn classify(error: E, is_retryable: impl FnOnce(&E) -> bool) -> Self {
        if is_retryable(&error) {
            Self::Retryable(error)
        } else {
            Self::Fatal(error)
        }
    }
}

/// Runs a fallible operation up to `max_attempts` times with backoff between
/// failures.
///
/// Attempts are strictly sequential and each call to `execute*` owns its own
/// attempt counter, so a single caller can be shared between tasks.
#[derive(Clone, Debug, Default)]
pub struct RetryingCaller<S = TokioSleeper> {
    config: RetryConfig,
    sleeper: S,
}

impl RetryingCaller {
    /// Creates a caller that sleeps on the tokio timer.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> RetryingCaller<S> {
    /// Replaces the delay capability, e.g. with a recording sleeper in tests.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RetryingCaller<S2> {
        RetryingCaller {
            config: self.config,
            sleeper,
        }
    }

    /// Replaces the retry policy, keeping the sleeper.
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the retry policy applied to every call.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Every error is treated as retryable. On exhaustion the error of the
    /// last attempt is returned in [`RetryError::OperationFailure`]; earlier
    /// errors are dropped. An invalid configuration is reported before
    /// `operation` is ever invoked.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> CallResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_classified(|| {
            let attempt = operation();
            async move { attempt.await.map_err(Attempt::Retryable) }
        })
        .await
    }

    /// Like [`RetryingCaller::execute`], but only retries errors the
    /// predicate accepts. Any other error aborts the loop.
    pub async fn execute_if<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> CallResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let is_retryable = &is_retryable;
        self.execute_classified(|| {
            let attempt = operation();
            async move {
                attempt
                    .await
                    .map_err(|err| Attempt::classify(err, is_retryable))
            }
        })
        .await
    }

    /// Runs an operation that tags its own failures.
    ///
    /// [`Attempt::Retryable`] errors follow the same budget and backoff as
    /// [`RetryingCaller::execute`]; an [`Attempt::Fatal`] error stops the loop
    /// at once with [`RetryError::Aborted`].
    pub async fn execute_classified<T, E, F, Fut>(&self, mut operation: F) -> CallResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
    {
        self.config.validate()?;
        let max_attempts = u32::try_from(self.config.max_attempts)
            .map_err(|_| ConfigError::MaxAttempts(self.config.max_attempts))?;

        let mut attempt = 1u32;
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, max_attempts, "starting attempt");

            let error = match operation().await {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    if attempt > 1 {
                        tracing::debug!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(Attempt::Fatal(source)) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempt, "operation failed with non-retryable error");
                    return Err(RetryError::Aborted {
                        attempts: attempt,
                        source,
                    });
                }
                Err(Attempt::Retryable(source)) => source,
            };

            if attempt >= max_attempts {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = attempt, "retry budget exhausted");
                return Err(RetryError::OperationFailure {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.config.delay_for(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt,
                max_attempts,
                "attempt failed, retrying after {} ms",
                delay.as_millis()
            );

            // A zero delay never suspends.
            if !delay.is_zero() {
                self.sleeper.sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

/// Runs `operation` under `config` on the tokio timer.
///
/// Shorthand for `RetryingCaller::new(config.clone()).execute(operation)`.
pub async fn execute<T, E, F, Fut>(operation: F, config: &RetryConfig) -> CallResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    RetryingCaller::new(config.clone()).execute(operation).await
}
