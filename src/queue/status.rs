//! Status snapshot published by a job queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueProtocolError;

/// State of a queue's consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    /// Consumer is taking jobs
    Running,
    /// Consumer is alive but holding
    Paused,
    /// Consumer thread is not running or the queue is disconnected
    Stopped,
    /// Queue contents changed; listeners should refresh
    Modified,
}

impl QueueStatus {
    /// Status implied by the consumer's state.
    pub fn derive(consumer_running: bool, connected: bool, awaiting_pause: bool) -> Self {
        if !consumer_running || !connected {
            QueueStatus::Stopped
        } else if awaiting_pause {
            QueueStatus::Paused
        } else {
            QueueStatus::Running
        }
    }
}

/// Broadcast on the queue status topic whenever the queue's status changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusBean {
    /// Job queue id
    pub queue_id: String,
    /// Display name of the job queue
    pub job_queue_name: String,
    /// Submission queue name
    pub queue_name: String,
    /// Current status
    pub queue_status: QueueStatus,
    /// Beamline the queue serves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beamline: Option<String>,
    /// Host the queue runs on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// When this snapshot was published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<DateTime<Utc>>,
}

impl QueueStatusBean {
    /// Create a snapshot for this host, reading the beamline from `BEAMLINE`.
    pub fn new(
        queue_id: impl Into<String>,
        job_queue_name: impl Into<String>,
        queue_name: impl Into<String>,
        queue_status: QueueStatus,
    ) -> Self {
        let host_name = match hostname::get() {
            Ok(name) => Some(name.to_string_lossy().into_owned()),
            Err(err) => {
                tracing::warn!(error = %err, "could not resolve local host name");
                None
            }
        };

        Self {
            queue_id: queue_id.into(),
            job_queue_name: job_queue_name.into(),
            queue_name: queue_name.into(),
            queue_status,
            beamline: std::env::var("BEAMLINE").ok(),
            host_name,
            publish_time: None,
        }
    }

    /// Update the status and stamp the publish time, ready to broadcast.
    pub fn touch(&mut self, queue_status: QueueStatus) {
        self.queue_status = queue_status;
        self.publish_time = Some(Utc::now());
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
