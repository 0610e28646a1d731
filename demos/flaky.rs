use std::sync::atomic::{AtomicU32, Ordering};

use retry_http::{RetryConfig, RetryingCaller};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let caller = RetryingCaller::new(RetryConfig::new(4, 200));
    let calls = AtomicU32::new(0);

    let value = caller
        .execute(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                println!("attempt {attempt}");
                if attempt < 3 {
                    Err(format!("attempt {attempt} failed"))
                } else {
                    Ok(attempt * 10)
                }
            }
        })
        .await
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    println!("succeeded with {value} after {} attempts", calls.load(Ordering::SeqCst));
    Ok(())
}
