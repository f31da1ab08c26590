//! Injected decisions: which failures are worth retrying, and who
//! gets told about a retry before the executor waits.

/// Decides whether a failure should be retried.
///
/// Any `FnMut(&E) -> bool` closure is a predicate. Use [Always] to retry
/// every failure until the budget runs out.
pub trait RetryPredicate<E> {
    fn is_retryable(&mut self, error: &E) -> bool;
}

impl<E, F> RetryPredicate<E> for F
where
    F: FnMut(&E) -> bool,
{
    fn is_retryable(&mut self, error: &E) -> bool {
        (self)(error)
    }
}

/// Predicate that retries every failure
#[derive(Debug, Copy, Clone, Default)]
pub struct Always;

impl<E> RetryPredicate<E> for Always {
    fn is_retryable(&mut self, _error: &E) -> bool {
        true
    }
}

/// Hook invoked with the 1-based attempt index and the failure that
/// caused the retry, right before the executor waits.
///
/// It is never called for the first attempt, for a success, or for the
/// failure that ends the loop. An `Err` returned from here aborts the
/// retry loop with [RetryError::Observer](crate::RetryError::Observer).
pub trait RetryObserver<E> {
    fn on_retry(&mut self, attempt: u32, error: &E) -> anyhow::Result<()>;
}

impl<E, F, R> RetryObserver<E> for F
where
    F: FnMut(u32, &E) -> R,
    R: ObserverOutcome,
{
    fn on_retry(&mut self, attempt: u32, error: &E) -> anyhow::Result<()> {
        (self)(attempt, error).into_outcome()
    }
}

/// The absent observer
#[derive(Debug, Copy, Clone, Default)]
pub struct NoObserver;

impl<E> RetryObserver<E> for NoObserver {
    fn on_retry(&mut self, _attempt: u32, _error: &E) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Return type of an observer closure.
///
/// Lets observers be written either as plain side effects returning `()`
/// or as fallible hooks returning `Result<(), impl Into<anyhow::Error>>`.
pub trait ObserverOutcome {
    fn into_outcome(self) -> anyhow::Result<()>;
}

impl ObserverOutcome for () {
    fn into_outcome(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<X: Into<anyhow::Error>> ObserverOutcome for Result<(), X> {
    fn into_outcome(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Build a [RetryPredicate] from a pattern
///
/// ```
/// use retry_executor::{retry_if, retry_on, DelayStrategy, RetryConfig};
///
/// #[derive(Debug)]
/// enum FetchError {
///     Timeout,
///     NotFound,
/// }
///
/// let result: Result<u8, _> = retry_if(
///     || Err(FetchError::NotFound),
///     retry_on!(FetchError::Timeout),
///     DelayStrategy::Normal,
///     &RetryConfig::new(3, 0),
/// );
/// assert!(matches!(result.unwrap_err().into_cause(), FetchError::NotFound));
/// ```
#[macro_export]
macro_rules! retry_on {
    ($($pattern:pat_param)|+) => {
        |error: &_| matches!(error, $($pattern)|+)
    };
}
