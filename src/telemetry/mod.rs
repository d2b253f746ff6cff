//! Telemetry module for logging and metrics.

mod logging;
mod metrics;

pub use logging::{init_logging, LogConfig};
pub use metrics::{Counter, DeviceStats, MetricsRegistry};
