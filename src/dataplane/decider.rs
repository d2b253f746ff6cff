//! L2 forwarding decision
//!
//! Decides, from the destination address and the device's address table,
//! whether a frame is flooded, dropped or forwarded to a single port, and
//! whether that decision is stable enough to be installed on the device.

use super::AddressTable;
use crate::protocol::ethernet::Frame;
use crate::protocol::openflow::PacketData;
use crate::protocol::{MacAddr, PortNo};

/// Addressing of one frame delivered by a packet-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub in_port: PortNo,
    pub packet: PacketData,
}

impl InboundFrame {
    /// Take the addresses of a parsed packet-in frame
    pub fn from_frame(frame: &Frame<'_>, in_port: PortNo, packet: PacketData) -> Self {
        Self {
            src: frame.src_mac(),
            dst: frame.dst_mac(),
            in_port,
            packet,
        }
    }
}

/// Set of ports a flooded frame leaves on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodScope {
    /// Every port, like a hub
    AllPorts,
    /// Every port except the one the frame arrived on
    AllExceptIngress,
}

impl FloodScope {
    /// Reserved output port implementing the scope
    pub fn output_port(&self) -> PortNo {
        match self {
            FloodScope::AllPorts => PortNo::ALL,
            FloodScope::AllExceptIngress => PortNo::FLOOD,
        }
    }
}

/// What to do with the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Flood(FloodScope),
    /// Destination sits behind the ingress port
    Drop,
    ForwardToPort(PortNo),
}

/// Result of a forwarding decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingOutcome {
    pub decision: Decision,
    /// Persist the decision as a device rule instead of a one-shot send
    pub install_rule: bool,
}

impl ForwardingOutcome {
    fn new(decision: Decision, install_rule: bool) -> Self {
        Self {
            decision,
            install_rule,
        }
    }
}

/// Make the forwarding decision for a frame
///
/// `table` must already contain the mapping learned from this frame's
/// source. The result depends only on the frame and the table contents.
pub fn decide(frame: &InboundFrame, table: &AddressTable) -> ForwardingOutcome {
    if frame.dst.is_multicast() {
        return ForwardingOutcome::new(Decision::Flood(FloodScope::AllPorts), true);
    }

    match table.lookup(&frame.dst) {
        Some(port) if port == frame.in_port => ForwardingOutcome::new(Decision::Drop, false),
        Some(port) => ForwardingOutcome::new(Decision::ForwardToPort(port), true),
        None => ForwardingOutcome::new(Decision::Flood(FloodScope::AllExceptIngress), false),
    }
}
