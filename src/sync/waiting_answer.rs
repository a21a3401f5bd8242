//! A canned answer that parks the caller until the observer resumes it.
//!
//! Stands in for a collaborator call (moving a positioner, running a script,
//! running a device) so the observing thread can act while that call is in
//! flight, then let it complete with a fixed result.

use std::time::Duration;

use super::rendezvous::{Phase, Rendezvous};
use crate::error::RendezvousError;

/// Rendezvous that hands back a clone of `result` once released.
#[derive(Debug)]
pub struct WaitingAnswer<T> {
    rendezvous: Rendezvous,
    result: T,
}

impl<T: Clone> WaitingAnswer<T> {
    /// Create an answer bounded by the default rendezvous timeout.
    pub fn new(result: T) -> Self {
        Self {
            rendezvous: Rendezvous::new(),
            result,
        }
    }

    /// Create an answer with a custom wait bound.
    pub fn with_timeout(result: T, timeout: Duration) -> Self {
        Self {
            rendezvous: Rendezvous::with_timeout(timeout),
            result,
        }
    }

    /// Called from the worker: park until resumed, then return the result.
    pub fn answer(&self) -> Result<T, RendezvousError> {
        self.rendezvous.run_guarded()?;
        Ok(self.result.clone())
    }

    /// Block until the worker is parked in [`answer`](Self::answer).
    #[must_use = "a timeout means the answer was never invoked"]
    pub fn wait_until_called(&self) -> Result<(), RendezvousError> {
        self.rendezvous.wait_until_called()
    }

    /// Block until the worker is parked or `timeout` elapses.
    #[must_use = "a timeout means the answer was never invoked"]
    pub fn wait_until_called_for(&self, timeout: Duration) -> Result<(), RendezvousError> {
        self.rendezvous.wait_until_called_for(timeout)
    }

    /// Let the parked worker return its result.
    pub fn resume(&self) {
        self.rendezvous.release();
    }

    /// Fail the parked worker with [`RendezvousError::Interrupted`].
    pub fn interrupt(&self) {
        self.rendezvous.interrupt();
    }

    /// Whether a worker is currently parked.
    pub fn is_waiting(&self) -> bool {
        self.rendezvous.phase() == Phase::Running
    }

    /// How many times the answer has been invoked.
    pub fn times_called(&self) -> u64 {
        self.rendezvous.times_called()
    }
}
