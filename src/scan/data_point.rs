//! Scan data points and the bounded history cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// One measurement record from a running scan.
///
/// The payload is opaque to the relay; only `unique_name` matters, since it
/// identifies which run the point belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanDataPoint {
    /// Identifier of the run this point belongs to
    pub unique_name: String,
    /// Zero-based index of the point within its run
    #[serde(default)]
    pub point_number: u64,
    /// Time the point was acquired
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Scannable and detector values, uninterpreted
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ScanDataPoint {
    /// Create a point stamped with the current time.
    pub fn new(unique_name: impl Into<String>, point_number: u64, payload: serde_json::Value) -> Self {
        Self {
            unique_name: unique_name.into(),
            point_number,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Fixed-capacity FIFO of the points from the current run.
///
/// All retained points share one `unique_name`. A point from a different run
/// clears the cache before it is appended.
#[derive(Debug, Clone)]
pub struct PointCache {
    points: VecDeque<Arc<ScanDataPoint>>,
    max_size: usize,
}

impl PointCache {
    /// Create an empty cache holding at most `max_size` points.
    pub fn new(max_size: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Append a point, resetting on run change and evicting the oldest points
    /// beyond the bound. Returns true when the point started a new run.
    pub fn push(&mut self, point: Arc<ScanDataPoint>) -> bool {
        let new_run = self
            .points
            .front()
            .is_some_and(|head| head.unique_name != point.unique_name);
        if new_run {
            self.points.clear();
        }

        self.points.push_back(point);
        while self.points.len() > self.max_size {
            self.points.pop_front();
        }
        new_run
    }

    /// Owned copy of the cached points, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<ScanDataPoint>> {
        self.points.iter().cloned().collect()
    }

    /// Run identifier of the cached points, if any.
    pub fn current_run(&self) -> Option<&str> {
        self.points.front().map(|p| p.unique_name.as_str())
    }

    /// Drop every cached point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Number of cached points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Configured bound.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
