//! Protocol types
//!
//! Just enough L2/L3 parsing to learn addresses and classify packets, plus
//! the OpenFlow message model exchanged with devices.

pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod openflow;
pub mod types;

pub use types::*;
