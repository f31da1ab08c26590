use retry_executor::{DelayStrategy, RetryConfig, RetryFuture};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

async fn poll_job(calls: &AtomicU32) -> anyhow::Result<&'static str> {
    tokio::time::sleep(Duration::from_millis(10)).await;
    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
        anyhow::bail!("job still running")
    }
    Ok("done")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let calls = AtomicU32::new(0);
    let status = RetryFuture::new(|| poll_job(&calls), RetryConfig::new(4, 3))
        .on_retry(|attempt, e: &anyhow::Error| eprintln!("retry {attempt}: {e}"))
        .delay_strategy(DelayStrategy::Exponential)
        .await
        .map_err(|e| e.into_cause())?;

    eprintln!("status = {status:#?}");

    Ok(())
}
