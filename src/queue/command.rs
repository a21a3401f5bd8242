//! Commands sent to a remote job queue.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::job::{JobBean, JobStatus};
use crate::error::QueueProtocolError;

/// Every command a job queue accepts on its command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueCommand {
    /// Stop taking jobs off the queue after the current one
    PauseQueue,
    /// Resume taking jobs off the queue
    ResumeQueue,
    /// Stop the consumer
    StopQueue,
    /// Remove every waiting job
    ClearQueue,
    /// Forget running and completed jobs
    ClearCompleted,
    /// Add a job to the queue
    SubmitJob,
    /// Pause a running job
    PauseJob,
    /// Resume a paused job
    ResumeJob,
    /// Terminate a job
    TerminateJob,
    /// Move a waiting job one place towards the head
    MoveForward,
    /// Move a waiting job one place towards the tail
    MoveBackward,
    /// Remove a waiting job
    RemoveFromQueue,
    /// Remove a finished job from the status set
    RemoveCompleted,
    /// Fetch the waiting jobs
    GetQueue,
    /// Fetch running and completed jobs
    GetRunningAndCompleted,
    /// Fetch the queue status bean
    GetInfo,
}

impl QueueCommand {
    /// Name of the command on the wire, e.g. `STOP_QUEUE`.
    pub fn as_str(self) -> &'static str {
        match self {
            QueueCommand::PauseQueue => "PAUSE_QUEUE",
            QueueCommand::ResumeQueue => "RESUME_QUEUE",
            QueueCommand::StopQueue => "STOP_QUEUE",
            QueueCommand::ClearQueue => "CLEAR_QUEUE",
            QueueCommand::ClearCompleted => "CLEAR_COMPLETED",
            QueueCommand::SubmitJob => "SUBMIT_JOB",
            QueueCommand::PauseJob => "PAUSE_JOB",
            QueueCommand::ResumeJob => "RESUME_JOB",
            QueueCommand::TerminateJob => "TERMINATE_JOB",
            QueueCommand::MoveForward => "MOVE_FORWARD",
            QueueCommand::MoveBackward => "MOVE_BACKWARD",
            QueueCommand::RemoveFromQueue => "REMOVE_FROM_QUEUE",
            QueueCommand::RemoveCompleted => "REMOVE_COMPLETED",
            QueueCommand::GetQueue => "GET_QUEUE",
            QueueCommand::GetRunningAndCompleted => "GET_RUNNING_AND_COMPLETED",
            QueueCommand::GetInfo => "GET_INFO",
        }
    }

    /// Commands handled by the process running a job rather than the queue.
    pub fn is_job_command(self) -> bool {
        matches!(
            self,
            QueueCommand::PauseJob | QueueCommand::ResumeJob | QueueCommand::TerminateJob
        )
    }

    /// Status a job is put into when this command is accepted.
    pub fn requested_status(self) -> Option<JobStatus> {
        match self {
            QueueCommand::PauseJob => Some(JobStatus::RequestPause),
            QueueCommand::ResumeJob => Some(JobStatus::RequestResume),
            QueueCommand::TerminateJob => Some(JobStatus::RequestTerminate),
            _ => None,
        }
    }

    /// Whether the command is meaningless without a job bean.
    pub fn requires_job(self) -> bool {
        self.is_job_command()
            || matches!(
                self,
                QueueCommand::SubmitJob
                    | QueueCommand::MoveForward
                    | QueueCommand::MoveBackward
                    | QueueCommand::RemoveFromQueue
                    | QueueCommand::RemoveCompleted
            )
    }
}

impl fmt::Display for QueueCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command bean published on a queue's command topic and echoed back on the
/// acknowledgement topic with `result` or `error_message` filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCommandBean {
    /// Id of the target job queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_queue_id: Option<String>,
    /// Submission queue name of the target job queue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    /// What to do
    pub command: QueueCommand,
    /// Job the command applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_bean: Option<JobBean>,
    /// Set by the queue when the command failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set by the queue for query commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl QueueCommandBean {
    /// Create an unaddressed command.
    pub fn new(command: QueueCommand) -> Self {
        Self {
            job_queue_id: None,
            queue_name: None,
            command,
            job_bean: None,
            error_message: None,
            result: None,
        }
    }

    /// Address the command by job queue id.
    pub fn for_queue_id(mut self, job_queue_id: impl Into<String>) -> Self {
        self.job_queue_id = Some(job_queue_id.into());
        self
    }

    /// Address the command by submission queue name.
    pub fn for_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    /// Attach the job the command applies to.
    pub fn with_job(mut self, job: JobBean) -> Self {
        self.job_bean = Some(job);
        self
    }

    /// Whether a queue with this id and submission queue name should act on
    /// the command. Either identifier matching is enough.
    pub fn is_for_queue(&self, job_queue_id: &str, queue_name: &str) -> bool {
        self.job_queue_id.as_deref() == Some(job_queue_id)
            || self.queue_name.as_deref() == Some(queue_name)
    }

    /// Check the bean is addressed and carries a job when it needs one.
    pub fn validate(&self) -> Result<(), QueueProtocolError> {
        if self.job_queue_id.is_none() && self.queue_name.is_none() {
            return Err(QueueProtocolError::Unaddressed(self.command));
        }
        if self.command.requires_job() && self.job_bean.is_none() {
            return Err(QueueProtocolError::MissingJob(self.command));
        }
        Ok(())
    }

    /// Record a processing failure for the acknowledgement.
    pub fn mark_failed(&mut self, error: impl std::fmt::Display) {
        let queue = self
            .queue_name
            .as_deref()
            .or(self.job_queue_id.as_deref())
            .unwrap_or("<unknown>");
        self.error_message = Some(format!(
            "Could not process {} command for queue {}: {}",
            self.command, queue, error
        ));
    }

    /// Record a successful result for the acknowledgement.
    pub fn acknowledge(&mut self, result: Option<serde_json::Value>) {
        self.error_message = None;
        self.result = result;
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, QueueProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, QueueProtocolError> {
        Ok(serde_json::from_str(json)?)
    }
}
