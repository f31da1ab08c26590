//! Re-run a fallible operation until it succeeds, a predicate decides
//! its failure is not worth retrying, or a fixed retry budget is spent.
//!
//! The blocking entry points below all funnel into
//! [RetryExecutor::run]; [RetryFuture] drives the same state machine
//! on a tokio timer instead of a sleeping thread.
//!
//! ```
//! use retry_executor::{retry_notify, DelayStrategy, RetryConfig};
//!
//! let mut calls = 0;
//! let result = retry_notify(
//!     || {
//!         calls += 1;
//!         if calls < 3 { Err(std::io::Error::other("flaky")) } else { Ok(calls) }
//!     },
//!     |e: &std::io::Error| e.kind() == std::io::ErrorKind::Other,
//!     |attempt, e: &std::io::Error| eprintln!("warning {attempt}/{e}"),
//!     DelayStrategy::Normal,
//!     &RetryConfig::new(3, 5),
//! );
//! assert_eq!(result.unwrap(), 3);
//! ```

mod config;
pub mod delay_strategy;
pub mod error;
mod executor;
mod future;
pub mod policy;
mod sleep;

pub use config::RetryConfig;
pub use delay_strategy::{DelayCalculator, DelayStrategy};
pub use error::{Interrupted, RetryError, RetryErrorKind};
pub use executor::RetryExecutor;
pub use future::{FutureFactory, RetryFuture};
pub use policy::{Always, NoObserver, ObserverOutcome, RetryObserver, RetryPredicate};
pub use sleep::{InterruptPolicy, InterruptibleSleeper, Interrupter, Sleeper, ThreadSleeper};

/// Retry every failure of `operation` with [DelayStrategy::Normal]
pub fn retry<T, E, Op>(operation: Op, config: &RetryConfig) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
{
    RetryExecutor::new(*config).run(operation, Always, NoObserver)
}

/// Retry every failure of `operation`, waiting according to `delay_strategy`
pub fn retry_with_strategy<T, E, Op, D>(
    operation: Op,
    delay_strategy: D,
    config: &RetryConfig,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
    D: DelayCalculator,
{
    RetryExecutor::new(*config).delay_strategy(delay_strategy).run(operation, Always, NoObserver)
}

/// Retry the failures of `operation` accepted by `predicate`
pub fn retry_if<T, E, Op, P, D>(
    operation: Op,
    predicate: P,
    delay_strategy: D,
    config: &RetryConfig,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
    P: FnMut(&E) -> bool,
    D: DelayCalculator,
{
    RetryExecutor::new(*config).delay_strategy(delay_strategy).run(operation, predicate, NoObserver)
}

/// Like [retry_if], telling `observer` about every retry before waiting
pub fn retry_notify<T, E, Op, P, O, R, D>(
    operation: Op,
    predicate: P,
    observer: O,
    delay_strategy: D,
    config: &RetryConfig,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
    P: FnMut(&E) -> bool,
    O: FnMut(u32, &E) -> R,
    R: ObserverOutcome,
    D: DelayCalculator,
{
    RetryExecutor::new(*config).delay_strategy(delay_strategy).run(operation, predicate, observer)
}

/// The full form every other entry point is a shorthand for.
///
/// `None` as `observer` behaves exactly like [retry_if]. The observer type
/// still has to be named for `None`, a plain function pointer will do:
///
/// ```
/// use retry_executor::{run, DelayStrategy, RetryConfig};
///
/// let config = RetryConfig::new(2, 1);
/// let mut calls = 0;
///
/// let silent = run(
///     || -> Result<(), String> {
///         calls += 1;
///         Err(format!("call #{calls}"))
///     },
///     |_: &String| true,
///     None::<fn(u32, &String)>,
///     DelayStrategy::Normal,
///     &config,
/// );
/// assert_eq!(silent.unwrap_err().into_cause(), "call #3");
///
/// let mut retries = Vec::new();
/// let noisy = run(
///     || Err::<(), _>("down"),
///     |_: &&str| true,
///     Some(|attempt: u32, _: &&str| retries.push(attempt)),
///     DelayStrategy::Normal,
///     &config,
/// );
/// assert!(noisy.unwrap_err().is_exhausted());
/// assert_eq!(retries, [1, 2]);
/// ```
pub fn run<T, E, Op, P, O, R, D>(
    operation: Op,
    predicate: P,
    observer: Option<O>,
    delay_strategy: D,
    config: &RetryConfig,
) -> Result<T, RetryError<E>>
where
    Op: FnMut() -> Result<T, E>,
    P: FnMut(&E) -> bool,
    O: FnMut(u32, &E) -> R,
    R: ObserverOutcome,
    D: DelayCalculator,
{
    let executor = RetryExecutor::new(*config).delay_strategy(delay_strategy);
    match observer {
        Some(observer) => executor.run(operation, predicate, observer),
        None => executor.run(operation, predicate, NoObserver),
    }
}
