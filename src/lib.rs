//! # GDA Events
//!
//! Concurrency core shared by the GDA acquisition server and its clients.
//!
//! ## Crate Structure
//!
//! - **`scan`**: `ScanDataRelay`, which subscribes once to an upstream scan
//!   event source and fans status changes and data points out to many
//!   listeners, keeping a capped history of the current run for late
//!   subscribers.
//! - **`sync`**: `Rendezvous` and `WaitingAnswer`, bounded two-party pause
//!   points used to force deterministic interleavings between a worker and an
//!   observer thread.
//! - **`queue`**: job-queue command and status beans as they travel on the
//!   wire.
//! - **`config`**: Figment-based configuration (`config/gda.toml` + `GDA_`
//!   environment overrides).
//! - **`error`**: error types for each concern plus the consolidated `GdaError`.
//! - **`tracing_init`**: `tracing-subscriber` setup.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gda_events::scan::{ScanDataPoint, ScanDataRelay, ScanEvent, ScanEventBroadcaster, ScanStatus};
//!
//! let source = Arc::new(ScanEventBroadcaster::new());
//! let relay = ScanDataRelay::new(source.clone(), 100);
//! relay.connect()?;
//!
//! source.publish(&ScanEvent::status(ScanStatus::Running));
//! source.publish(&ScanDataPoint::new("scan-1", 0, serde_json::json!({ "x": 0.5 })).into());
//!
//! assert_eq!(relay.current_data_points().len(), 1);
//! relay.dispose();
//! # Ok::<(), gda_events::error::RelayError>(())
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod scan;
pub mod sync;
pub mod tracing_init;

pub use error::{AppResult, GdaError};
