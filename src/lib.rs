//! learnswitch - Learning switch controller
//!
//! Per-device MAC learning and forwarding decisions for OpenFlow switches,
//! with an optional IP blacklist/whitelist applied before learning.

pub mod config;
pub mod controller;
pub mod dataplane;
pub mod error;
pub mod protocol;
pub mod telemetry;

pub use error::{Error, Result};
