use retry_executor::{
    Always, InterruptPolicy, InterruptibleSleeper, RetryConfig, RetryError, RetryExecutor,
};
use std::thread;
use std::time::{Duration, Instant};

fn main() -> anyhow::Result<()> {
    let (sleeper, interrupter) = InterruptibleSleeper::new();
    let executor = RetryExecutor::new(RetryConfig::new(5, 2_000)).sleeper(sleeper);

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        interrupter.interrupt()
    });

    let started = Instant::now();
    let result = executor.run(
        || Err::<(), _>(anyhow::anyhow!("upstream unavailable")),
        Always,
        |attempt: u32, e: &anyhow::Error| eprintln!("retry {attempt} after: {e}"),
    );
    match result {
        Err(RetryError::Interrupted { attempt, cause }) => {
            eprintln!("cancelled before attempt {attempt} ({:?}): {cause}", started.elapsed())
        }
        other => anyhow::bail!("expected an interruption, got {other:?}"),
    }
    canceller.join().expect("canceller thread panicked");

    // Same setup, ignoring interruptions: the loop just moves on
    let (sleeper, interrupter) = InterruptibleSleeper::new();
    let executor = RetryExecutor::new(RetryConfig::new(2, 500))
        .sleeper(sleeper)
        .interrupt_policy(InterruptPolicy::Ignore);
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        interrupter.interrupt()
    });

    let started = Instant::now();
    let mut calls = 0;
    let value = executor
        .run(
            || {
                calls += 1;
                if calls < 3 { Err("not yet") } else { Ok(calls) }
            },
            Always,
            |attempt: u32, e: &&str| eprintln!("retry {attempt}: {e}"),
        )
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    eprintln!("value = {value} after {:?}", started.elapsed());
    canceller.join().expect("canceller thread panicked");

    Ok(())
}
