use crate::error::Interrupted;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Blocks the calling thread between two attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;

    /// Called once when a retry loop starts, before the first attempt
    fn reset(&self) {}
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        (**self).sleep(duration)
    }

    fn reset(&self) {
        (**self).reset()
    }
}

/// `std::thread::sleep`, cannot be interrupted
#[derive(Debug, Copy, Clone, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
        Ok(())
    }
}

/// What the executor does when a [Sleeper] reports [Interrupted]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum InterruptPolicy {
    /// Stop retrying and return
    /// [RetryError::Interrupted](crate::RetryError::Interrupted)
    #[default]
    Propagate,
    /// Discard the interruption and run the next attempt right away
    Ignore,
}

/// A sleeper whose wait can be cut short from another thread
/// through its [Interrupter].
///
/// An interruption sent while nobody is sleeping is kept and ends the
/// next sleep immediately, unless a new retry loop starts first: every
/// [RetryExecutor::run](crate::RetryExecutor::run) drops the interruptions
/// left over from before it began.
#[derive(Debug)]
pub struct InterruptibleSleeper {
    receiver: Mutex<Receiver<()>>,
}

/// Handle used to wake up an [InterruptibleSleeper]
#[derive(Debug, Clone)]
pub struct Interrupter {
    sender: Sender<()>,
}

impl InterruptibleSleeper {
    pub fn new() -> (Self, Interrupter) {
        let (sender, receiver) = mpsc::channel();
        (Self { receiver: Mutex::new(receiver) }, Interrupter { sender })
    }

    fn receiver(&self) -> MutexGuard<'_, Receiver<()>> {
        match self.receiver.lock() {
            Ok(receiver) => receiver,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        let started = Instant::now();
        let receiver = self.receiver();
        match receiver.recv_timeout(duration) {
            Ok(()) => Err(Interrupted),
            Err(RecvTimeoutError::Timeout) => Ok(()),
            // every interrupter is gone, nobody can wake us up anymore
            Err(RecvTimeoutError::Disconnected) => {
                ThreadSleeper.sleep(duration.saturating_sub(started.elapsed()))
            }
        }
    }

    fn reset(&self) {
        let receiver = self.receiver();
        while receiver.try_recv().is_ok() {}
    }
}

impl Interrupter {
    /// Returns `false` if the sleeper has already been dropped
    pub fn interrupt(&self) -> bool {
        self.sender.send(()).is_ok()
    }
}
