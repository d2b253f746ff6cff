//! Data plane components
//!
//! Per-device packet-in handling: address learning, forwarding decisions,
//! firewall filtering, and the session tying them to a connection.

mod decider;
mod fdb;
mod firewall;
mod session;

pub use decider::{decide, Decision, FloodScope, ForwardingOutcome, InboundFrame};
pub use fdb::AddressTable;
pub use firewall::{FirewallFilter, IpPrefix, Verdict};
pub use session::{
    build_instruction, Connection, DeviceSession, Handled, SessionState, SwitchHandler,
};
