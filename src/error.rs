use std::fmt::{Debug, Display, Formatter};

/// Terminal error returned by the executor once it stops retrying.
///
/// Every variant wraps the last failure of the operation, so callers can
/// tell "gave up retrying" apart from the operation's own error type and
/// still reach the root cause through [cause](RetryError::cause) or
/// [into_cause](RetryError::into_cause).
#[derive(Debug)]
pub enum RetryError<E> {
    /// The predicate refused to retry `cause`
    Rejected { attempt: u32, cause: E },
    /// All `retries` were used and the operation still failed
    Exhausted { retries: u32, cause: E },
    /// The retry observer failed while being told about `attempt`
    Observer { attempt: u32, cause: E, source: anyhow::Error },
    /// The delay before `attempt` was interrupted
    Interrupted { attempt: u32, cause: E },
}

/// Discriminant of [RetryError] without the payload
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RetryErrorKind {
    Rejected,
    Exhausted,
    Observer,
    Interrupted,
}

impl<E> RetryError<E> {
    pub fn kind(&self) -> RetryErrorKind {
        match self {
            RetryError::Rejected { .. } => RetryErrorKind::Rejected,
            RetryError::Exhausted { .. } => RetryErrorKind::Exhausted,
            RetryError::Observer { .. } => RetryErrorKind::Observer,
            RetryError::Interrupted { .. } => RetryErrorKind::Interrupted,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Last failure returned by the operation
    pub fn cause(&self) -> &E {
        match self {
            RetryError::Rejected { cause, .. }
            | RetryError::Exhausted { cause, .. }
            | RetryError::Observer { cause, .. }
            | RetryError::Interrupted { cause, .. } => cause,
        }
    }

    pub fn into_cause(self) -> E {
        match self {
            RetryError::Rejected { cause, .. }
            | RetryError::Exhausted { cause, .. }
            | RetryError::Observer { cause, .. }
            | RetryError::Interrupted { cause, .. } => cause,
        }
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Rejected { attempt: 0, cause } => {
                write!(f, "Not retryable: {cause}")
            }
            RetryError::Rejected { attempt, cause } => {
                write!(f, "Not retryable after {attempt} retries: {cause}")
            }
            RetryError::Exhausted { retries, cause } => {
                write!(f, "Failed after retrying {retries} times: {cause}")
            }
            RetryError::Observer { attempt, cause, source } => {
                write!(f, "Retry observer failed on attempt {attempt} ({source:#}): {cause}")
            }
            RetryError::Interrupted { attempt, cause } => {
                write!(f, "Interrupted while waiting for attempt {attempt}: {cause}")
            }
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause())
    }
}

/// Returned by a [Sleeper](crate::Sleeper) whose wait was cut short
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Interrupted;

impl Display for Interrupted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for Interrupted {}
