//! Job-queue protocol beans.
//!
//! Wire vocabulary for controlling a remote job queue: the commands a client
//! sends ([`QueueCommandBean`]), the jobs they refer to ([`JobBean`]), and the
//! status snapshot the queue publishes back ([`QueueStatusBean`]). The queue
//! engine itself lives on the server.

pub mod command;
pub mod job;
pub mod status;

pub use command::{QueueCommand, QueueCommandBean};
pub use job::{JobBean, JobStatus};
pub use status::{QueueStatus, QueueStatusBean};
