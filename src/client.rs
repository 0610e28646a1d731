use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::{
    Attempt, CallResult, HttpError, HttpOptions, HttpRequest, HttpResponse, RetryingCaller,
    Sleeper, TokioSleeper,
};

/// Sends [`HttpRequest`]s and retries them through a [`RetryingCaller`].
#[derive(Clone)]
pub struct HttpFetcher<S = TokioSleeper> {
    http: reqwest::Client,
    options: HttpOptions,
    caller: RetryingCaller<S>,
}

impl<S> fmt::Debug for HttpFetcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("options", &self.options)
            .finish()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with default timeout and retry policy.
    pub fn new() -> Self {
        let options = HttpOptions::default();
        Self {
            http: reqwest::Client::new(),
            caller: RetryingCaller::new(options.retry.clone()),
            options,
        }
    }
}

impl<S: Sleeper> HttpFetcher<S> {
    /// Applies timeout and retry options.
    pub fn with_options(mut self, opts: HttpOptions) -> Self {
        self.caller = self.caller.with_config(opts.retry.clone());
        self.options = opts;
        self
    }

    /// Replaces the delay capability used between attempts.
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> HttpFetcher<S2> {
        HttpFetcher {
            http: self.http,
            options: self.options,
            caller: self.caller.with_sleeper(sleeper),
        }
    }

    /// Returns the timeout and retry options in effect.
    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    /// Sends `request` once.
    ///
    /// Any status outside 2xx is returned as [`HttpError::Status`] with the
    /// body as lossy text. Successful bodies are kept as raw bytes.
    pub async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .timeout(Duration::from_millis(self.options.timeout_ms));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(HttpError::Transport)?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await.map_err(HttpError::Transport)?;

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body: body.to_vec(),
        })
    }

    /// Sends `request`, retrying every failure until the attempt budget runs
    /// out.
    pub async fn fetch_with_retry(
        &self,
        request: &HttpRequest,
    ) -> CallResult<HttpResponse, HttpError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(method = %request.method, url = %request.url, "fetching with retry");

        self.caller.execute(|| self.fetch(request)).await
    }

    /// Sends `request`, retrying only failures for which
    /// [`HttpError::is_transient`] holds.
    pub async fn fetch_with_retry_transient(
        &self,
        request: &HttpRequest,
    ) -> CallResult<HttpResponse, HttpError> {
        self.caller
            .execute_if(|| self.fetch(request), HttpError::is_transient)
            .await
    }

    /// Sends `request` with retry and decodes the successful body as JSON.
    ///
    /// A body that fails to decode aborts immediately; resending the same
    /// request is not expected to fix it.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
    ) -> CallResult<T, HttpError> {
        self.caller
            .execute_classified(|| async move {
                let response = self.fetch(request).await.map_err(Attempt::Retryable)?;
                response.json::<T>().map_err(Attempt::Fatal)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::HttpFetcher;
    use crate::{HttpOptions, RetryConfig};

    #[test]
    fn with_options_updates_retry_policy() {
        let fetcher = HttpFetcher::new().with_options(HttpOptions {
            timeout_ms: 500,
            retry: RetryConfig::new(7, 20),
        });
        assert_eq!(fetcher.options().timeout_ms, 500);
        assert_eq!(fetcher.caller.config(), &RetryConfig::new(7, 20));
    }

    #[test]
    fn debug_lists_options() {
        let debug = format!("{:?}", HttpFetcher::new());
        assert!(debug.contains("timeout_ms: 10000"));
    }
}
