//! Thread rendezvous primitives.
//!
//! - [`Rendezvous`]: single-slot pause point with bounded waits
//! - [`WaitingAnswer`]: a rendezvous that returns a canned value when resumed

pub mod rendezvous;
pub mod waiting_answer;

pub use rendezvous::{Phase, Rendezvous, DEFAULT_TIMEOUT};
pub use waiting_answer::WaitingAnswer;
