use std::time::Duration;

use crate::delay_strategy::{DelayCalculator, DelayStrategy};
use crate::error::RetryError;
use crate::policy::{RetryObserver, RetryPredicate};
use crate::sleep::{InterruptPolicy, Sleeper, ThreadSleeper};
use crate::RetryConfig;

/// Per-invocation retry state shared by the blocking and the async executor.
///
/// Starts with the whole budget of `config` and is consumed one retry at a
/// time by [on_failure](RetryBudget::on_failure).
#[derive(Debug)]
pub(crate) struct RetryBudget {
    config: RetryConfig,
    retries_left: u32,
}

/// A failure that will be retried after `delay`
pub(crate) struct ScheduledRetry<E> {
    pub(crate) attempt: u32,
    pub(crate) delay: Duration,
    pub(crate) cause: E,
}

impl RetryBudget {
    pub(crate) fn new(config: RetryConfig) -> Self {
        Self { config, retries_left: config.max_retries() }
    }

    fn retries_done(&self) -> u32 {
        self.config.max_retries() - self.retries_left
    }

    /// Consults the predicate and the remaining budget for `error`.
    ///
    /// When the failure is retried the observer has already been told about
    /// it by the time this returns; the caller only has to wait for `delay`.
    pub(crate) fn on_failure<E, P, O, D>(
        &mut self,
        error: E,
        predicate: &mut P,
        observer: &mut O,
        delay_calculator: &D,
    ) -> Result<ScheduledRetry<E>, RetryError<E>>
    where
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
        D: DelayCalculator,
    {
        if !predicate.is_retryable(&error) {
            #[cfg(feature = "log")]
            log::warn!("Failure is not retryable after {} retries", self.retries_done());
            return Err(RetryError::Rejected { attempt: self.retries_done(), cause: error });
        }
        if self.retries_left == 0 {
            #[cfg(feature = "log")]
            log::warn!("Giving up after {} retries", self.config.max_retries());
            return Err(RetryError::Exhausted {
                retries: self.config.max_retries(),
                cause: error,
            });
        }

        self.retries_left -= 1;
        let attempt = self.retries_done();
        let delay = delay_calculator.delay(attempt, &self.config);

        if let Err(source) = observer.on_retry(attempt, &error) {
            #[cfg(feature = "log")]
            log::warn!("Retry observer failed on attempt {attempt}: {source:#}");
            return Err(RetryError::Observer { attempt, cause: error, source });
        }

        #[cfg(feature = "log")]
        log::debug!(
            "Retry {attempt}/{} scheduled in {delay:?}",
            self.config.max_retries()
        );
        Ok(ScheduledRetry { attempt, delay, cause: error })
    }
}

/// Blocking retry loop.
///
/// Runs the operation on the calling thread, waiting between attempts with
/// its [Sleeper]. The executor keeps no state between two calls of
/// [run](RetryExecutor::run), so one instance can be shared freely.
///
/// ```
/// use retry_executor::{Always, DelayStrategy, NoObserver, RetryConfig, RetryExecutor};
///
/// let executor = RetryExecutor::new(RetryConfig::new(3, 1))
///     .delay_strategy(DelayStrategy::Exponential);
///
/// let mut calls = 0;
/// let value = executor.run(
///     || {
///         calls += 1;
///         if calls < 3 { Err("not yet") } else { Ok(calls) }
///     },
///     Always,
///     NoObserver,
/// );
/// assert_eq!(value.unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RetryExecutor<D = DelayStrategy, S = ThreadSleeper> {
    config: RetryConfig,
    delay_calculator: D,
    sleeper: S,
    interrupt_policy: InterruptPolicy,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            delay_calculator: DelayStrategy::default(),
            sleeper: ThreadSleeper,
            interrupt_policy: InterruptPolicy::default(),
        }
    }
}

impl<D, S> RetryExecutor<D, S>
where
    D: DelayCalculator,
    S: Sleeper,
{
    pub fn delay_strategy<D2>(self, delay_calculator: D2) -> RetryExecutor<D2, S>
    where
        D2: DelayCalculator,
    {
        RetryExecutor {
            config: self.config,
            delay_calculator,
            sleeper: self.sleeper,
            interrupt_policy: self.interrupt_policy,
        }
    }

    pub fn sleeper<S2: Sleeper>(self, sleeper: S2) -> RetryExecutor<D, S2> {
        RetryExecutor {
            config: self.config,
            delay_calculator: self.delay_calculator,
            sleeper,
            interrupt_policy: self.interrupt_policy,
        }
    }

    /// See [InterruptPolicy]
    pub fn interrupt_policy(mut self, interrupt_policy: InterruptPolicy) -> Self {
        self.interrupt_policy = interrupt_policy;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Invokes `operation` until it succeeds, `predicate` rejects its failure
    /// or the retry budget is spent.
    ///
    /// Before each wait `observer` receives the 1-based retry index and the
    /// failure being retried.
    pub fn run<T, E, Op, P, O>(
        &self,
        mut operation: Op,
        mut predicate: P,
        mut observer: O,
    ) -> Result<T, RetryError<E>>
    where
        Op: FnMut() -> Result<T, E>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        let mut budget = RetryBudget::new(self.config);
        self.sleeper.reset();
        loop {
            let error = match operation() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            let retry =
                budget.on_failure(error, &mut predicate, &mut observer, &self.delay_calculator)?;

            if self.sleeper.sleep(retry.delay).is_err() {
                match self.interrupt_policy {
                    InterruptPolicy::Ignore => {
                        #[cfg(feature = "log")]
                        log::debug!("Delay before retry {} interrupted, ignoring", retry.attempt);
                    }
                    InterruptPolicy::Propagate => {
                        return Err(RetryError::Interrupted {
                            attempt: retry.attempt,
                            cause: retry.cause,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Interrupted, RetryErrorKind};
    use crate::policy::{Always, NoObserver};
    use crate::sleep::InterruptibleSleeper;
    use std::cell::{Cell, RefCell};

    /// Records every requested delay instead of blocking
    #[derive(Debug, Default)]
    struct RecordingSleeper {
        delays: RefCell<Vec<Duration>>,
        interrupt_on: Option<usize>,
    }

    impl RecordingSleeper {
        fn millis(&self) -> Vec<u128> {
            self.delays.borrow().iter().map(Duration::as_millis).collect()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
            self.delays.borrow_mut().push(duration);
            if self.interrupt_on == Some(self.delays.borrow().len()) {
                Err(Interrupted)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Debug, PartialEq)]
    enum TestError {
        Arithmetic,
        IndexOutOfBounds,
    }

    fn executor(
        config: RetryConfig,
        sleeper: &RecordingSleeper,
    ) -> RetryExecutor<DelayStrategy, &RecordingSleeper> {
        RetryExecutor::new(config).sleeper(sleeper)
    }

    #[test]
    fn no_retry_on_success() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let mut observed = 0;

        let result = executor(RetryConfig::new(3, 5), &sleeper).run(
            || {
                calls.set(calls.get() + 1);
                Ok::<_, TestError>(format!("This many paws: {}", calls.get()))
            },
            Always,
            |_: u32, _: &TestError| observed += 1,
        );

        assert_eq!(result.unwrap(), "This many paws: 1");
        assert_eq!(calls.get(), 1);
        assert_eq!(observed, 0);
        assert!(sleeper.millis().is_empty());
    }

    #[test]
    fn no_retry_on_unmatched_error() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let err = executor(RetryConfig::new(3, 5), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                |e: &TestError| *e == TestError::IndexOutOfBounds,
                NoObserver,
            )
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert_eq!(err.kind(), RetryErrorKind::Rejected);
        assert_eq!(err.into_cause(), TestError::Arithmetic);
        assert!(sleeper.millis().is_empty());
    }

    #[test]
    fn retry_until_budget_exhausted() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);
        let mut observed = Vec::new();

        let err = executor(RetryConfig::new(3, 5), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                |e: &TestError| *e == TestError::Arithmetic,
                |attempt: u32, _: &TestError| observed.push(attempt),
            )
            .unwrap_err();

        assert_eq!(calls.get(), 4);
        assert_eq!(observed, vec![1, 2, 3]);
        assert!(err.is_exhausted());
        assert_eq!(err.cause(), &TestError::Arithmetic);
        assert_eq!(sleeper.millis(), vec![5, 10, 15]);
    }

    #[test]
    fn retry_until_success() {
        let sleeper = RecordingSleeper::default();
        let failures = Cell::new(0);
        let mut observed = Vec::new();

        let result = executor(RetryConfig::new(3, 5), &sleeper).run(
            || {
                if failures.get() < 2 {
                    failures.set(failures.get() + 1);
                    return Err(TestError::Arithmetic);
                }
                Ok(format!("X{}", failures.get()))
            },
            |e: &TestError| *e == TestError::Arithmetic,
            |attempt: u32, _: &TestError| observed.push(attempt),
        );

        assert_eq!(result.unwrap(), "X2");
        assert_eq!(observed, vec![1, 2]);
        assert_eq!(sleeper.millis(), vec![5, 10]);
    }

    #[test]
    fn zero_retries_runs_once() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let err = executor(RetryConfig::new(0, 5), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                Always,
                NoObserver,
            )
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert!(err.is_exhausted());
        assert!(sleeper.millis().is_empty());
    }

    #[test]
    fn always_failing_runs_budget_plus_one() {
        for max_retries in 0..6 {
            let sleeper = RecordingSleeper::default();
            let calls = Cell::new(0);
            let mut observed = 0;

            let err = executor(RetryConfig::new(max_retries, 0), &sleeper)
                .run(
                    || -> Result<(), _> {
                        calls.set(calls.get() + 1);
                        Err(TestError::IndexOutOfBounds)
                    },
                    Always,
                    |_: u32, _: &TestError| observed += 1,
                )
                .unwrap_err();

            assert_eq!(calls.get(), max_retries + 1);
            assert_eq!(observed, max_retries);
            assert!(matches!(err, RetryError::Exhausted { retries, .. } if retries == max_retries));
        }
    }

    #[test]
    fn rejection_after_retries_reports_attempt() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let err = executor(RetryConfig::new(5, 1), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err(TestError::Arithmetic)
                    } else {
                        Err(TestError::IndexOutOfBounds)
                    }
                },
                |e: &TestError| *e == TestError::Arithmetic,
                NoObserver,
            )
            .unwrap_err();

        assert_eq!(calls.get(), 3);
        assert!(matches!(
            err,
            RetryError::Rejected { attempt: 2, cause: TestError::IndexOutOfBounds }
        ));
    }

    #[test]
    fn exponential_delays() {
        let sleeper = RecordingSleeper::default();
        let err = executor(RetryConfig::new(3, 5), &sleeper)
            .delay_strategy(DelayStrategy::Exponential)
            .run(|| Err::<(), _>(TestError::Arithmetic), Always, NoObserver)
            .unwrap_err();

        assert!(err.is_exhausted());
        assert_eq!(sleeper.millis(), vec![5, 25, 125]);
    }

    #[test]
    fn custom_delay_calculator() {
        let sleeper = RecordingSleeper::default();
        let _ = executor(RetryConfig::new(3, 7), &sleeper)
            .delay_strategy(|_: u32, base: u64| base)
            .run(|| Err::<(), _>(TestError::Arithmetic), Always, NoObserver);

        assert_eq!(sleeper.millis(), vec![7, 7, 7]);
    }

    #[test]
    fn observer_runs_before_delay() {
        let sleeper = RecordingSleeper::default();
        let mut delays_seen_by_observer = Vec::new();

        let _ = executor(RetryConfig::new(2, 5), &sleeper).run(
            || Err::<(), _>(TestError::Arithmetic),
            Always,
            |_: u32, _: &TestError| delays_seen_by_observer.push(sleeper.delays.borrow().len()),
        );

        assert_eq!(delays_seen_by_observer, vec![0, 1]);
    }

    #[test]
    fn observer_failure_aborts() {
        let sleeper = RecordingSleeper::default();
        let calls = Cell::new(0);

        let err = executor(RetryConfig::new(3, 5), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                Always,
                |attempt: u32, _: &TestError| {
                    if attempt == 2 {
                        anyhow::bail!("log sink closed");
                    }
                    Ok(())
                },
            )
            .unwrap_err();

        assert_eq!(calls.get(), 2);
        assert_eq!(sleeper.millis(), vec![5]);
        match err {
            RetryError::Observer { attempt, cause, source } => {
                assert_eq!(attempt, 2);
                assert_eq!(cause, TestError::Arithmetic);
                assert_eq!(source.to_string(), "log sink closed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn interruption_propagates_by_default() {
        let sleeper = RecordingSleeper { interrupt_on: Some(2), ..Default::default() };
        let calls = Cell::new(0);

        let err = executor(RetryConfig::new(3, 5), &sleeper)
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                Always,
                NoObserver,
            )
            .unwrap_err();

        assert_eq!(calls.get(), 2);
        assert!(matches!(err, RetryError::Interrupted { attempt: 2, .. }));
    }

    #[test]
    fn interruption_ignored() {
        let sleeper = RecordingSleeper { interrupt_on: Some(1), ..Default::default() };
        let calls = Cell::new(0);

        let result = executor(RetryConfig::new(3, 5), &sleeper)
            .interrupt_policy(InterruptPolicy::Ignore)
            .run(
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err(TestError::Arithmetic)
                    } else {
                        Ok(calls.get())
                    }
                },
                Always,
                NoObserver,
            );

        assert_eq!(result.unwrap(), 3);
        assert_eq!(sleeper.millis(), vec![5, 10]);
    }

    #[test]
    fn stale_interrupt_does_not_leak_into_next_run() {
        let (sleeper, interrupter) = InterruptibleSleeper::new();
        let executor = RetryExecutor::new(RetryConfig::new(1, 1)).sleeper(sleeper);
        interrupter.interrupt();

        let calls = Cell::new(0);
        let err = executor
            .run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                Always,
                NoObserver,
            )
            .unwrap_err();

        assert_eq!(calls.get(), 2);
        assert!(err.is_exhausted());
    }

    #[test]
    fn executor_is_reusable() {
        let sleeper = RecordingSleeper::default();
        let executor = executor(RetryConfig::new(1, 5), &sleeper);

        for _ in 0..2 {
            let calls = Cell::new(0);
            let _ = executor.run(
                || -> Result<(), _> {
                    calls.set(calls.get() + 1);
                    Err(TestError::Arithmetic)
                },
                Always,
                NoObserver,
            );
            assert_eq!(calls.get(), 2);
        }
        assert_eq!(sleeper.millis(), vec![5, 5]);
    }
}
