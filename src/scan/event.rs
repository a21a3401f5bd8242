//! Upstream scan events and the run state derived from them.

use serde::{Deserialize, Serialize};

use super::data_point::ScanDataPoint;

/// Scan status reported by the acquisition server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// No scan is running
    Idle,
    /// A scan is acquiring points
    Running,
    /// A scan is held mid-run
    Paused,
}

impl ScanStatus {
    /// The listener signal this status maps onto.
    pub fn signal(self) -> ScanSignal {
        match self {
            ScanStatus::Running => ScanSignal::Started,
            ScanStatus::Paused => ScanSignal::Paused,
            ScanStatus::Idle => ScanSignal::Stopped,
        }
    }
}

/// Coalesced lifecycle signal delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanSignal {
    /// Scan started or resumed
    Started,
    /// Scan paused
    Paused,
    /// Scan finished, aborted or never started
    Stopped,
}

/// Run state as last reported upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RunState {
    /// Nothing running
    #[default]
    NotRunning = 0,
    /// Scan in progress
    Running = 1,
    /// Scan paused
    Paused = 2,
}

impl RunState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Paused,
            _ => RunState::NotRunning,
        }
    }
}

impl From<ScanStatus> for RunState {
    fn from(status: ScanStatus) -> Self {
        match status {
            ScanStatus::Idle => RunState::NotRunning,
            ScanStatus::Running => RunState::Running,
            ScanStatus::Paused => RunState::Paused,
        }
    }
}

/// A notification pushed by the upstream scan event source.
///
/// Encoded as JSON with a `type` tag. Tags this version does not know decode
/// to [`ScanEvent::Unknown`], which consumers ignore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEvent {
    /// The server's scan status changed
    StatusChanged {
        /// New status
        status: ScanStatus,
    },
    /// A point was acquired
    DataPoint(ScanDataPoint),
    /// Any event kind not understood here
    #[serde(other)]
    Unknown,
}

impl ScanEvent {
    /// Decode one event from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encode this event as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Shorthand for a status change event.
    pub fn status(status: ScanStatus) -> Self {
        ScanEvent::StatusChanged { status }
    }
}

impl From<ScanDataPoint> for ScanEvent {
    fn from(point: ScanDataPoint) -> Self {
        ScanEvent::DataPoint(point)
    }
}
