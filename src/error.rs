/// Rejected [`RetryConfig`](crate::RetryConfig) values.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `max_attempts` must be between 1 and `u32::MAX`.
    #[error("max_attempts must be in 1..=4294967295, got {0}")]
    MaxAttempts(i64),
    /// `base_delay_ms` must not be negative.
    #[error("base_delay_ms must be >= 0, got {0}")]
    BaseDelay(i64),
    /// An environment variable was set but could not be parsed.
    #[error("invalid {var}: {message}")]
    Env { var: &'static str, message: String },
}

/// Terminal failure of a retried call.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Configuration was rejected before any attempt was made.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// Every attempt failed; `source` is the error of the last one.
    #[error("operation failed after {attempts} attempt(s): {source}")]
    OperationFailure { attempts: u32, source: E },
    /// A fatal error stopped the loop before the attempt budget ran out.
    #[error("operation aborted at attempt {attempts}: {source}")]
    Aborted { attempts: u32, source: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up. Zero for configuration errors.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidConfiguration(_) => 0,
            Self::OperationFailure { attempts, .. } | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// The error returned by the last attempt, if any attempt ran.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::OperationFailure { source, .. } | Self::Aborted { source, .. } => Some(source),
        }
    }

    /// Consumes the error and returns the last attempt's error, if any.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::InvalidConfiguration(_) => None,
            Self::OperationFailure { source, .. } | Self::Aborted { source, .. } => Some(source),
        }
    }

    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

/// Error type returned by [`HttpFetcher`](crate::HttpFetcher).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
}

impl HttpError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Request timeouts, throttling and server-side statuses are transient, as
    /// are connection and timeout failures in the transport. Decode errors and
    /// other client statuses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            Self::Status { status, .. } => matches!(*status, 408 | 429 | 500..=599),
            Self::Decode(_) | Self::Encode(_) => false,
        }
    }
}
