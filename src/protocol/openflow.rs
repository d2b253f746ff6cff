//! OpenFlow message model
//!
//! Typed views of the packet-in notification received from a device and of
//! the flow-mod / packet-out instructions sent back to it. Wire encoding is
//! left to the connection that carries them.

use super::{MacAddr, PortNo};
use std::fmt;
use std::sync::Arc;

/// Datapath identifier of a connected device
pub type Dpid = u64;

/// Frame bytes as delivered by a packet-in, plus the device buffer holding them
///
/// Never interpreted by the forwarding logic; carried unchanged into the
/// instruction so the triggering frame is released by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketData {
    /// Device-side buffer id, `None` when the frame was not buffered
    pub buffer_id: Option<u32>,
    /// Raw frame bytes
    pub data: Arc<[u8]>,
}

impl PacketData {
    pub fn new(buffer_id: Option<u32>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            buffer_id,
            data: data.into(),
        }
    }
}

/// Packet-in notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub in_port: PortNo,
    pub packet: PacketData,
}

impl PacketIn {
    pub fn new(in_port: impl Into<PortNo>, buffer_id: Option<u32>, data: Vec<u8>) -> Self {
        Self {
            in_port: in_port.into(),
            packet: PacketData::new(buffer_id, data),
        }
    }
}

/// Match fields of a flow rule; `None` is a wildcard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowMatch {
    pub in_port: Option<PortNo>,
    pub dl_src: Option<MacAddr>,
    pub dl_dst: Option<MacAddr>,
}

impl fmt::Display for FlowMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        if let Some(port) = self.in_port {
            fields.push(format!("in_port={}", port));
        }
        if let Some(src) = self.dl_src {
            fields.push(format!("dl_src={}", src));
        }
        if let Some(dst) = self.dl_dst {
            fields.push(format!("dl_dst={}", dst));
        }
        if fields.is_empty() {
            write!(f, "*")
        } else {
            write!(f, "{}", fields.join(","))
        }
    }
}

/// Instruction action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit the frame on a port (physical or reserved)
    Output(PortNo),
}

/// Install a flow rule on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    pub flow_match: FlowMatch,
    pub actions: Vec<Action>,
    /// Seconds without matching traffic before expiry (0 = never)
    pub idle_timeout: u16,
    /// Seconds before unconditional expiry (0 = never)
    pub hard_timeout: u16,
    /// Triggering frame, released through the new rule
    pub packet: PacketData,
}

/// Send a single frame without installing a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOut {
    pub in_port: PortNo,
    pub actions: Vec<Action>,
    pub packet: PacketData,
}

/// Outbound instruction toward a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    FlowMod(FlowMod),
    PacketOut(PacketOut),
}

impl Instruction {
    pub fn actions(&self) -> &[Action] {
        match self {
            Instruction::FlowMod(m) => &m.actions,
            Instruction::PacketOut(p) => &p.actions,
        }
    }

    /// Output ports named by the instruction's actions
    pub fn output_ports(&self) -> Vec<PortNo> {
        self.actions()
            .iter()
            .map(|Action::Output(port)| *port)
            .collect()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outputs: Vec<String> = self.output_ports().iter().map(|p| p.to_string()).collect();
        match self {
            Instruction::FlowMod(m) => write!(
                f,
                "flow_mod match=[{}] output={} idle={} hard={}",
                m.flow_match,
                outputs.join(","),
                m.idle_timeout,
                m.hard_timeout
            ),
            Instruction::PacketOut(p) => write!(
                f,
                "packet_out in_port={} output={}",
                p.in_port,
                outputs.join(",")
            ),
        }
    }
}
