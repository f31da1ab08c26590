use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{ready, TryFuture};
use pin_project::pin_project;
use tokio::time::{sleep, Sleep};

use crate::delay_strategy::{DelayCalculator, DelayStrategy};
use crate::error::RetryError;
use crate::executor::RetryBudget;
use crate::policy::{Always, NoObserver, ObserverOutcome, RetryObserver, RetryPredicate};
use crate::RetryConfig;

/// Spawns a new `Future` by `new` method every time
/// the previous one resolved to an error
pub trait FutureFactory<E> {
    type Future: TryFuture<Error = E>;

    #[allow(clippy::wrong_self_convention)]
    fn new(&mut self) -> Self::Future;
}

impl<T, Fut, E> FutureFactory<E> for T
where
    T: FnMut() -> Fut,
    Fut: TryFuture<Error = E>,
{
    type Future = Fut;

    fn new(&mut self) -> Fut {
        (self)()
    }
}

#[pin_project(project = FutureStateProj)]
enum FutureState<Fut> {
    WaitingForFuture {
        #[pin]
        future: Fut,
    },
    TimerActive {
        #[pin]
        delay: Sleep,
    },
    Completed,
}

/// Non-blocking counterpart of [RetryExecutor](crate::RetryExecutor).
///
/// Drives the same retry state machine, but waits between attempts with
/// [tokio::time::sleep] instead of blocking the thread. Cancelling the
/// retry loop is just dropping this future.
///
/// Like most futures it panics if polled again after returning `Ready`.
///
/// ```
/// use retry_executor::{DelayStrategy, RetryConfig, RetryFuture};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let value = RetryFuture::new(
///     || {
///         calls += 1;
///         let call = calls;
///         async move { if call < 2 { Err("busy") } else { Ok(call) } }
///     },
///     RetryConfig::new(3, 1),
/// )
/// .retry_if(|e: &&str| *e == "busy")
/// .on_retry(|attempt, e: &&str| eprintln!("retry {attempt}: {e}"))
/// .delay_strategy(DelayStrategy::Exponential)
/// .await;
///
/// assert_eq!(value.unwrap(), 2);
/// # }
/// ```
#[pin_project]
pub struct RetryFuture<F, P, O, D, E>
where
    F: FutureFactory<E>,
{
    factory: F,
    predicate: P,
    observer: O,
    delay_calculator: D,
    budget: RetryBudget,
    #[pin]
    state: FutureState<F::Future>,
    phantom: PhantomData<E>,
}

impl<F, E> RetryFuture<F, Always, NoObserver, DelayStrategy, E>
where
    F: FutureFactory<E>,
{
    /// Retries every failure with [DelayStrategy::Normal] and no observer
    /// until the setters below say otherwise.
    ///
    /// [FutureFactory] has a blanket implementation for `FnMut` closures,
    /// so a closure returning a future can be passed directly.
    pub fn new(mut factory: F, config: RetryConfig) -> Self {
        let future = factory.new();
        Self {
            factory,
            predicate: Always,
            observer: NoObserver,
            delay_calculator: DelayStrategy::default(),
            budget: RetryBudget::new(config),
            state: FutureState::WaitingForFuture { future },
            phantom: PhantomData,
        }
    }
}

impl<F, P, O, D, E> RetryFuture<F, P, O, D, E>
where
    F: FutureFactory<E>,
{
    pub fn retry_if<P2>(self, predicate: P2) -> RetryFuture<F, P2, O, D, E>
    where
        P2: FnMut(&E) -> bool,
    {
        RetryFuture {
            factory: self.factory,
            predicate,
            observer: self.observer,
            delay_calculator: self.delay_calculator,
            budget: self.budget,
            state: self.state,
            phantom: PhantomData,
        }
    }

    pub fn on_retry<O2, R>(self, observer: O2) -> RetryFuture<F, P, O2, D, E>
    where
        O2: FnMut(u32, &E) -> R,
        R: ObserverOutcome,
    {
        RetryFuture {
            factory: self.factory,
            predicate: self.predicate,
            observer,
            delay_calculator: self.delay_calculator,
            budget: self.budget,
            state: self.state,
            phantom: PhantomData,
        }
    }

    pub fn delay_strategy<D2>(self, delay_calculator: D2) -> RetryFuture<F, P, O, D2, E>
    where
        D2: DelayCalculator,
    {
        RetryFuture {
            factory: self.factory,
            predicate: self.predicate,
            observer: self.observer,
            delay_calculator,
            budget: self.budget,
            state: self.state,
            phantom: PhantomData,
        }
    }
}

impl<F, P, O, D, E> Future for RetryFuture<F, P, O, D, E>
where
    F: FutureFactory<E>,
    P: RetryPredicate<E>,
    O: RetryObserver<E>,
    D: DelayCalculator,
{
    type Output = Result<<<F as FutureFactory<E>>::Future as TryFuture>::Ok, RetryError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        loop {
            let future_retry = self.as_mut().project();
            let mut output = None;
            let new_state = match future_retry.state.project() {
                FutureStateProj::WaitingForFuture { future } => match ready!(future.try_poll(cx)) {
                    Ok(value) => {
                        output = Some(Ok(value));
                        FutureState::Completed
                    }
                    Err(error) => match future_retry.budget.on_failure(
                        error,
                        future_retry.predicate,
                        future_retry.observer,
                        future_retry.delay_calculator,
                    ) {
                        Ok(retry) if retry.delay.is_zero() => {
                            FutureState::WaitingForFuture { future: future_retry.factory.new() }
                        }
                        Ok(retry) => FutureState::TimerActive { delay: sleep(retry.delay) },
                        Err(e) => {
                            output = Some(Err(e));
                            FutureState::Completed
                        }
                    },
                },
                FutureStateProj::TimerActive { delay } => {
                    ready!(delay.poll(cx));
                    FutureState::WaitingForFuture { future: future_retry.factory.new() }
                }
                FutureStateProj::Completed => panic!("RetryFuture polled after completion"),
            };

            self.as_mut().project().state.set(new_state);
            if let Some(output) = output {
                return Poll::Ready(output);
            }
        }
    }
}
