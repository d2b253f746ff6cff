//! Scenario tests driving device sessions with recorded packet-ins
//!
//! Run with: cargo test --test scenarios

mod firewall;
mod harness;
mod replay;
mod switching;
