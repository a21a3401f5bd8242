//! Scan event relay.
//!
//! - [`data_point`]: `ScanDataPoint` and the bounded `PointCache`
//! - [`event`]: upstream `ScanEvent`s, `ScanStatus` and derived `RunState`
//! - [`source`]: the upstream seam plus an in-process broadcaster
//! - [`relay`]: `ScanDataRelay`, the fan-out to `ScanListener`s

pub mod data_point;
pub mod event;
pub mod relay;
pub mod source;

pub use data_point::{PointCache, ScanDataPoint};
pub use event::{RunState, ScanEvent, ScanSignal, ScanStatus};
pub use relay::{ScanDataRelay, ScanListener};
pub use source::{ScanEventBroadcaster, ScanEventObserver, ScanEventSource, SubscriptionId};
