//! Recorded notification traces
//!
//! A trace is a TOML list of connection-up, packet-in and connection-down
//! events replayed through a `Controller`. Packet-in frames are described by
//! their addresses and synthesized on load.
//!
//! ```toml
//! [[event]]
//! kind = "connection_up"
//! dpid = 1
//!
//! [[event]]
//! kind = "packet_in"
//! dpid = 1
//! in_port = 1
//! src = "00:00:00:00:00:aa"
//! dst = "00:00:00:00:00:bb"
//! ip_src = "10.0.0.1"
//! ip_dst = "10.0.0.2"
//! ```

use super::Controller;
use crate::dataplane::Connection;
use crate::protocol::ethernet::FrameBuilder;
use crate::protocol::ipv4::Ipv4Builder;
use crate::protocol::ipv6::Ipv6Builder;
use crate::protocol::openflow::{Dpid, Instruction, PacketIn};
use crate::protocol::{EtherType, MacAddr};
use crate::{Error, Result};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use tracing::{info, warn};

/// ARP body length, used as filler for non-IP frames
const FILLER_LEN: usize = 28;

#[derive(Debug, Clone, Deserialize)]
pub struct Trace {
    #[serde(default, rename = "event")]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    ConnectionUp {
        dpid: Dpid,
    },
    PacketIn {
        dpid: Dpid,
        in_port: u16,
        src: MacAddr,
        dst: MacAddr,
        #[serde(default)]
        buffer_id: Option<u32>,
        #[serde(default)]
        ip_src: Option<IpAddr>,
        #[serde(default)]
        ip_dst: Option<IpAddr>,
        /// Used when no IP addresses are given; ARP by default
        #[serde(default)]
        ethertype: Option<u16>,
    },
    ConnectionDown {
        dpid: Dpid,
    },
}

impl Trace {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let trace: Trace =
            toml::from_str(content).map_err(|e| Error::Config(format!("trace: {}", e)))?;
        // Address pairs are checked before any event runs
        for event in &trace.events {
            event.packet_in()?;
        }
        Ok(trace)
    }
}

impl TraceEvent {
    /// Synthesize the packet-in of a `PacketIn` event
    pub fn packet_in(&self) -> Result<Option<PacketIn>> {
        let TraceEvent::PacketIn {
            in_port,
            src,
            dst,
            buffer_id,
            ip_src,
            ip_dst,
            ethertype,
            ..
        } = self
        else {
            return Ok(None);
        };

        let builder = FrameBuilder::new().src_mac(*src).dst_mac(*dst);
        let builder = match (ip_src, ip_dst) {
            (Some(IpAddr::V4(s)), Some(IpAddr::V4(d))) => builder
                .ethertype(EtherType::Ipv4 as u16)
                .payload(&Ipv4Builder::new().src_addr(*s).dst_addr(*d).build()),
            (Some(IpAddr::V6(s)), Some(IpAddr::V6(d))) => builder
                .ethertype(EtherType::Ipv6 as u16)
                .payload(&Ipv6Builder::new().src_addr(*s).dst_addr(*d).build()),
            (None, None) => builder
                .ethertype(ethertype.unwrap_or(EtherType::Arp as u16))
                .payload(&[0u8; FILLER_LEN]),
            _ => {
                return Err(Error::Config(format!(
                    "trace: packet_in {} -> {} needs ip_src and ip_dst of one family",
                    src, dst
                )))
            }
        };

        Ok(Some(PacketIn::new(*in_port, *buffer_id, builder.build())))
    }
}

/// Connection that logs every instruction it is handed
#[derive(Debug, Clone)]
pub struct LogConnection {
    dpid: Dpid,
}

impl LogConnection {
    pub fn new(dpid: Dpid) -> Self {
        Self { dpid }
    }
}

impl Connection for LogConnection {
    fn send(&mut self, instruction: Instruction) -> Result<()> {
        info!("device {:016x} <- {}", self.dpid, instruction);
        Ok(())
    }
}

/// Drive every event of a trace through the controller
///
/// Returns once every queued packet-in has been handled. Sessions the trace
/// leaves connected stay open. Packet-ins for unknown devices are logged and
/// skipped.
pub async fn replay(controller: &mut Controller, trace: &Trace) -> Result<()> {
    for event in &trace.events {
        match event {
            TraceEvent::ConnectionUp { dpid } => {
                controller
                    .connection_up(*dpid, LogConnection::new(*dpid))
                    .await
            }
            TraceEvent::PacketIn { dpid, .. } => {
                let Some(packet_in) = event.packet_in()? else {
                    continue;
                };
                if let Err(e) = controller.packet_in(*dpid, packet_in) {
                    warn!("Skipping trace packet-in: {}", e);
                }
            }
            TraceEvent::ConnectionDown { dpid } => {
                if let Err(e) = controller.connection_down(*dpid).await {
                    warn!("Skipping trace connection-down: {}", e);
                }
            }
        }
    }

    controller.sync().await;
    Ok(())
}
