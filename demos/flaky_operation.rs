use retry_executor::{retry_notify, retry_on, DelayStrategy, RetryConfig, RetryError};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
enum ReadError {
    Busy(u32),
    Corrupted,
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Busy(n) => write!(f, "device busy (call #{n})"),
            ReadError::Corrupted => write!(f, "sector corrupted"),
        }
    }
}

impl std::error::Error for ReadError {}

fn main() -> anyhow::Result<()> {
    let mut calls = 0;
    let sector = retry_notify(
        || {
            calls += 1;
            if calls < 3 {
                Err(ReadError::Busy(calls))
            } else {
                Ok(format!("sector read on call #{calls}"))
            }
        },
        retry_on!(ReadError::Busy(_)),
        |attempt, e: &ReadError| eprintln!("warning {attempt}/{e}"),
        DelayStrategy::Normal,
        &RetryConfig::new(3, 100),
    )?;
    eprintln!("sector = {sector:#?}");

    let corrupted = retry_notify(
        || Err::<String, _>(ReadError::Corrupted),
        retry_on!(ReadError::Busy(_)),
        |attempt, e: &ReadError| eprintln!("warning {attempt}/{e}"),
        DelayStrategy::Exponential,
        &RetryConfig::new(3, 5),
    );
    if let Err(RetryError::Rejected { cause, .. }) = &corrupted {
        eprintln!("not retried: {cause}");
    }

    Ok(())
}
