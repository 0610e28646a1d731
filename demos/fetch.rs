use retry_http::{HttpFetcher, HttpOptions, HttpRequest, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("FETCH_URL")?;
    let retry = RetryConfig::from_env()?;

    let fetcher = HttpFetcher::new().with_options(HttpOptions {
        timeout_ms: 5_000,
        retry,
    });

    let mut request = HttpRequest::get(url);
    if let Ok(token) = std::env::var("FETCH_TOKEN") {
        request = request.bearer_auth(token);
    }

    let body: serde_json::Value = fetcher.fetch_json(&request).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(())
}
