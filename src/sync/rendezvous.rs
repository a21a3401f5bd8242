//! Two-party rendezvous with bounded waits.
//!
//! A worker thread calls [`Rendezvous::run_guarded`] at the point it should
//! pause. An observing thread blocks in [`Rendezvous::wait_until_called`] until
//! the worker arrives, does whatever it needs while the worker is parked, then
//! calls [`Rendezvous::release`] to let it continue.
//!
//! ```text
//! Idle --run_guarded()--> Running --release()--> Idle
//! ```
//!
//! All state lives behind one mutex. Every wait is a predicate loop against a
//! monotonic deadline, so spurious wakeups are harmless and no wait is ever
//! unbounded.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::config::SyncConfig;
use crate::error::RendezvousError;

/// Default bound applied to every wait.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Observable phase of a [`Rendezvous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No worker is parked.
    Idle,
    /// A worker is parked inside `run_guarded`.
    Running,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    /// Incremented on every entry into `run_guarded`.
    entered: u64,
    /// Highest entry number that has been released.
    released: u64,
    interrupted: bool,
}

/// Single-slot pause point shared between a worker and an observer.
///
/// Not reentrant and not a semaphore: a second worker arriving while the slot
/// is taken gets [`RendezvousError::Occupied`].
#[derive(Debug)]
pub struct Rendezvous {
    state: Mutex<State>,
    called: Condvar,
    released: Condvar,
    default_timeout: Duration,
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl Rendezvous {
    /// Create a rendezvous using [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a rendezvous with a custom default timeout.
    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Idle,
                entered: 0,
                released: 0,
                interrupted: false,
            }),
            called: Condvar::new(),
            released: Condvar::new(),
            default_timeout,
        }
    }

    /// Create a rendezvous from configuration.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::with_timeout(config.default_timeout())
    }

    /// The bound used by the untimed-looking variants.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Current phase. Does not block on any condition.
    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    /// Number of times a worker has entered `run_guarded`.
    pub fn times_called(&self) -> u64 {
        self.state.lock().entered
    }

    /// Park the calling worker until [`release`](Self::release), bounded by the
    /// default timeout.
    pub fn run_guarded(&self) -> Result<(), RendezvousError> {
        self.run_guarded_for(self.default_timeout)
    }

    /// Park the calling worker until [`release`](Self::release) or `timeout`.
    ///
    /// On any failure the phase returns to `Idle` so the primitive is usable
    /// again.
    pub fn run_guarded_for(&self, timeout: Duration) -> Result<(), RendezvousError> {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();

        if state.phase == Phase::Running {
            return Err(RendezvousError::Occupied);
        }
        if state.interrupted {
            state.interrupted = false;
            return Err(RendezvousError::Interrupted);
        }

        state.entered += 1;
        let ticket = state.entered;
        state.phase = Phase::Running;
        trace!(ticket, "worker entered rendezvous");
        self.called.notify_all();

        let outcome = wait_while(&mut state, &self.released, deadline, |s| {
            s.released < ticket
        });

        match outcome {
            Ok(()) => {
                trace!(ticket, "worker released");
                Ok(())
            }
            Err(failure) => {
                // Leave the slot free for the next worker.
                state.phase = Phase::Idle;
                state.released = ticket;
                let err = match failure {
                    WaitFailure::Interrupted => RendezvousError::Interrupted,
                    WaitFailure::TimedOut => RendezvousError::Timeout {
                        operation: "release",
                        waited: timeout,
                    },
                };
                debug!(ticket, error = %err, "worker left rendezvous without release");
                Err(err)
            }
        }
    }

    /// Block until a worker is parked in `run_guarded`, bounded by the default
    /// timeout.
    #[must_use = "a timeout means the worker never arrived"]
    pub fn wait_until_called(&self) -> Result<(), RendezvousError> {
        self.wait_until_called_for(self.default_timeout)
    }

    /// Block until a worker is parked in `run_guarded` or `timeout` elapses.
    #[must_use = "a timeout means the worker never arrived"]
    pub fn wait_until_called_for(&self, timeout: Duration) -> Result<(), RendezvousError> {
        let deadline = deadline_after(timeout);
        let mut state = self.state.lock();

        wait_while(&mut state, &self.called, deadline, |s| {
            s.phase != Phase::Running
        })
        .map_err(|err| match err {
            WaitFailure::Interrupted => RendezvousError::Interrupted,
            WaitFailure::TimedOut => RendezvousError::Timeout {
                operation: "call",
                waited: timeout,
            },
        })
    }

    /// Let a parked worker continue. A no-op when nothing is parked.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Running {
            state.released = state.entered;
            state.phase = Phase::Idle;
            trace!(ticket = state.entered, "rendezvous released");
            self.released.notify_all();
        }
    }

    /// Wake whichever party is blocked with [`RendezvousError::Interrupted`].
    ///
    /// If nobody is blocked the interrupt stays pending and fails the next
    /// blocking call, like a thread's interrupt flag.
    pub fn interrupt(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        self.called.notify_all();
        self.released.notify_all();
    }
}

/// Deadline `timeout` from now, clamped so huge timeouts cannot overflow.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

// About 136 years.
const FAR_FUTURE: Duration = Duration::from_secs(u32::MAX as u64);

/// Wait on `condvar` while `blocked` holds, failing on interrupt or deadline.
fn wait_while<F>(
    state: &mut MutexGuard<'_, State>,
    condvar: &Condvar,
    deadline: Instant,
    mut blocked: F,
) -> Result<(), WaitFailure>
where
    F: FnMut(&State) -> bool,
{
    while blocked(&**state) {
        if state.interrupted {
            state.interrupted = false;
            return Err(WaitFailure::Interrupted);
        }
        if Instant::now() >= deadline {
            return Err(WaitFailure::TimedOut);
        }
        // Spurious or unrelated wakeups fall through to the re-check.
        let _ = condvar.wait_until(state, deadline);
    }
    Ok(())
}

enum WaitFailure {
    Interrupted,
    TimedOut,
}
