//! Jobs carried by queue commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Not yet submitted
    #[default]
    None,
    /// Submitted to the queue
    Submitted,
    /// Waiting in the queue
    Queued,
    /// Held back by the user
    Deferred,
    /// Being prepared to run
    Preparing,
    /// Running
    Running,
    /// Pause requested, not yet honoured
    RequestPause,
    /// Paused
    Paused,
    /// Resume requested, not yet honoured
    RequestResume,
    /// Resumed after a pause
    Resumed,
    /// Termination requested, not yet honoured
    RequestTerminate,
    /// Terminated by request
    Terminated,
    /// Running its final steps
    Finishing,
    /// Completed normally
    Complete,
    /// Failed
    Failed,
}

impl JobStatus {
    /// The job will not change status again.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            JobStatus::Terminated | JobStatus::Complete | JobStatus::Failed
        )
    }

    /// A user request the job has not acted on yet.
    pub fn is_request(self) -> bool {
        matches!(
            self,
            JobStatus::RequestPause | JobStatus::RequestResume | JobStatus::RequestTerminate
        )
    }

    /// The job has left the queue and not yet finished.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            JobStatus::Preparing
                | JobStatus::Running
                | JobStatus::RequestPause
                | JobStatus::Paused
                | JobStatus::RequestResume
                | JobStatus::Resumed
                | JobStatus::RequestTerminate
                | JobStatus::Finishing
        )
    }
}

/// A job as it travels in command and status beans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBean {
    /// Stable identifier; a job can only be run once per id
    pub unique_id: String,
    /// Human readable name
    #[serde(default)]
    pub name: String,
    /// Current status
    #[serde(default)]
    pub status: JobStatus,
    /// Last status message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Progress, 0 to 100
    #[serde(default)]
    pub percent_complete: f64,
    /// When the job was submitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<DateTime<Utc>>,
}

impl JobBean {
    /// Create a job with a fresh unique id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            unique_id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            status: JobStatus::None,
            message: None,
            percent_complete: 0.0,
            submission_time: None,
        }
    }

    /// Mark the job submitted now.
    pub fn submit(&mut self) {
        self.status = JobStatus::Submitted;
        self.submission_time = Some(Utc::now());
    }
}
