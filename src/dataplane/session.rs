//! Per-device learning switch session
//!
//! A session is bound to one device connection. Every packet-in runs the
//! same pipeline: firewall, learn the source address, decide, then hand at
//! most one instruction to the connection.

use super::{
    decide, AddressTable, Decision, FirewallFilter, FloodScope, ForwardingOutcome, InboundFrame,
    Verdict,
};
use crate::config::FlowConfig;
use crate::protocol::ethernet::Frame;
use crate::protocol::openflow::{Action, Dpid, FlowMatch, FlowMod, Instruction, PacketIn, PacketOut};
use crate::telemetry::MetricsRegistry;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Outbound side of a device connection
///
/// `send` hands the instruction over without waiting for the device. An
/// error means the connection is gone.
pub trait Connection: Send {
    fn send(&mut self, instruction: Instruction) -> Result<()>;
}

/// Notifications delivered to a device session
pub trait SwitchHandler {
    /// Process one packet-in; notifications for a device never overlap
    fn on_packet_in(&mut self, event: PacketIn) -> Result<Handled>;

    /// The device connection ended
    fn on_connection_closed(&mut self);
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Bound to the connection, no packet-in seen yet
    Created,
    Active,
    /// Terminal
    Closed,
}

/// How a packet-in was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// Rejected by the firewall; nothing learned, nothing sent
    Denied,
    Forwarded(ForwardingOutcome),
}

/// Learning switch state of one connected device
pub struct DeviceSession<C: Connection> {
    dpid: Dpid,
    state: SessionState,
    table: AddressTable,
    connection: C,
    firewall: Arc<FirewallFilter>,
    flow: FlowConfig,
    metrics: Arc<MetricsRegistry>,
}

impl<C: Connection> DeviceSession<C> {
    pub fn new(
        dpid: Dpid,
        connection: C,
        firewall: Arc<FirewallFilter>,
        flow: FlowConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        info!("Creating switch session for device {:016x}", dpid);
        metrics.session_opened(dpid);

        Self {
            dpid,
            state: SessionState::Created,
            table: AddressTable::new(),
            connection,
            firewall,
            flow,
            metrics,
        }
    }

    pub fn dpid(&self) -> Dpid {
        self.dpid
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        info!(
            "Closing switch session for device {:016x} ({} learned addresses)",
            self.dpid,
            self.table.len()
        );
        self.state = SessionState::Closed;
        self.table.clear();
        self.metrics.session_closed(self.dpid);
    }

    fn emit(&mut self, instruction: Instruction) -> Result<()> {
        trace!("device {:016x}: {}", self.dpid, instruction);
        let is_rule = matches!(instruction, Instruction::FlowMod(_));

        if let Err(e) = self.connection.send(instruction) {
            self.metrics.send_errors.inc();
            warn!("Send to device {:016x} failed: {}", self.dpid, e);
            self.close();
            return Err(Error::ConnectionLost {
                dpid: self.dpid,
                reason: e.to_string(),
            });
        }

        if is_rule {
            self.metrics.record_rule_installed(self.dpid);
        } else {
            self.metrics.record_packet_out(self.dpid);
        }
        Ok(())
    }
}

impl<C: Connection> SwitchHandler for DeviceSession<C> {
    fn on_packet_in(&mut self, event: PacketIn) -> Result<Handled> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed { dpid: self.dpid });
        }
        self.state = SessionState::Active;
        self.metrics.record_packet_in(self.dpid);

        let frame = match Frame::parse(&event.packet.data) {
            Ok(f) => f,
            Err(e) => {
                self.metrics.rx_errors.inc();
                debug!("device {:016x}: bad packet-in frame: {}", self.dpid, e);
                return Err(e);
            }
        };

        if self.firewall.classify(frame.ethertype(), frame.payload()) == Verdict::Deny {
            info!(
                "device {:016x}: firewall denied frame {} -> {} on port {}",
                self.dpid,
                frame.src_mac(),
                frame.dst_mac(),
                event.in_port
            );
            self.metrics.record_denied(self.dpid);
            return Ok(Handled::Denied);
        }

        let inbound = InboundFrame::from_frame(&frame, event.in_port, event.packet.clone());

        if let Some(previous) = self.table.learn(inbound.src, inbound.in_port) {
            debug!(
                "device {:016x}: {} moved from port {} to {}",
                self.dpid, inbound.src, previous, inbound.in_port
            );
        }
        self.metrics.set_learned_addresses(self.dpid, self.table.len());

        let outcome = decide(&inbound, &self.table);
        match outcome.decision {
            Decision::Flood(FloodScope::AllPorts) => {
                debug!("device {:016x}: multicast to {}", self.dpid, inbound.dst)
            }
            Decision::Flood(FloodScope::AllExceptIngress) => debug!(
                "device {:016x}: unknown destination {}, flooding",
                self.dpid, inbound.dst
            ),
            Decision::ForwardToPort(port) => debug!(
                "device {:016x}: known destination {} on port {}",
                self.dpid, inbound.dst, port
            ),
            Decision::Drop => trace!(
                "device {:016x}: {} is behind ingress port {}, dropping",
                self.dpid,
                inbound.dst,
                inbound.in_port
            ),
        }

        match build_instruction(&outcome, inbound, &self.flow) {
            Some(instruction) => {
                self.emit(instruction)?;
                if matches!(outcome.decision, Decision::Flood(_)) {
                    self.metrics.flooded.inc();
                }
            }
            None => self.metrics.dropped.inc(),
        }

        Ok(Handled::Forwarded(outcome))
    }

    fn on_connection_closed(&mut self) {
        self.close();
    }
}

/// Translate a forwarding outcome into the instruction sent to the device
///
/// Installed rules match on the destination for floods to every port, and on
/// ingress port plus both addresses otherwise. `Drop` yields nothing.
pub fn build_instruction(
    outcome: &ForwardingOutcome,
    frame: InboundFrame,
    flow: &FlowConfig,
) -> Option<Instruction> {
    let output = match outcome.decision {
        Decision::Drop => return None,
        Decision::Flood(scope) => scope.output_port(),
        Decision::ForwardToPort(port) => port,
    };
    let actions = vec![Action::Output(output)];

    if !outcome.install_rule {
        return Some(Instruction::PacketOut(PacketOut {
            in_port: frame.in_port,
            actions,
            packet: frame.packet,
        }));
    }

    let flow_match = match outcome.decision {
        Decision::Flood(FloodScope::AllPorts) => FlowMatch {
            dl_dst: Some(frame.dst),
            ..FlowMatch::default()
        },
        _ => FlowMatch {
            in_port: Some(frame.in_port),
            dl_src: Some(frame.src),
            dl_dst: Some(frame.dst),
        },
    };

    Some(Instruction::FlowMod(FlowMod {
        flow_match,
        actions,
        idle_timeout: flow.idle_timeout,
        hard_timeout: flow.hard_timeout,
        packet: frame.packet,
    }))
}
