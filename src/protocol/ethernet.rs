//! Ethernet frame parsing and construction

use super::{EtherType, MacAddr};
use crate::{Error, Result};

/// Minimum Ethernet frame size (without FCS)
pub const MIN_FRAME_SIZE: usize = 14;

const VLAN_HEADER_SIZE: usize = 18;

/// Parsed Ethernet frame (zero-copy reference)
#[derive(Debug)]
pub struct Frame<'a> {
    buffer: &'a [u8],
    payload_offset: usize,
}

impl<'a> Frame<'a> {
    /// Parse an Ethernet frame, skipping a single 802.1Q tag if present
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < MIN_FRAME_SIZE {
            return Err(Error::Parse(format!(
                "frame too short ({} bytes)",
                buffer.len()
            )));
        }

        let outer = u16::from_be_bytes([buffer[12], buffer[13]]);
        if outer != EtherType::Vlan as u16 {
            return Ok(Self {
                buffer,
                payload_offset: MIN_FRAME_SIZE,
            });
        }

        if buffer.len() < VLAN_HEADER_SIZE {
            return Err(Error::Parse("VLAN frame too short".into()));
        }
        Ok(Self {
            buffer,
            payload_offset: VLAN_HEADER_SIZE,
        })
    }

    pub fn dst_mac(&self) -> MacAddr {
        mac_at(self.buffer, 0)
    }

    pub fn src_mac(&self) -> MacAddr {
        mac_at(self.buffer, 6)
    }

    /// EtherType of the encapsulated packet (inner type for tagged frames)
    pub fn ethertype(&self) -> u16 {
        let offset = self.payload_offset - 2;
        u16::from_be_bytes([self.buffer[offset], self.buffer[offset + 1]])
    }

    /// Next-layer packet carried by the frame
    pub fn payload(&self) -> &[u8] {
        &self.buffer[self.payload_offset..]
    }
}

fn mac_at(buffer: &[u8], offset: usize) -> MacAddr {
    let mut octets = [0u8; 6];
    octets.copy_from_slice(&buffer[offset..offset + 6]);
    MacAddr(octets)
}

/// Builder for constructing Ethernet frames
pub struct FrameBuilder {
    dst: MacAddr,
    src: MacAddr,
    ethertype: u16,
    payload: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            dst: MacAddr::ZERO,
            src: MacAddr::ZERO,
            ethertype: EtherType::Ipv4 as u16,
            payload: Vec::new(),
        }
    }

    pub fn dst_mac(mut self, mac: MacAddr) -> Self {
        self.dst = mac;
        self
    }

    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.src = mac;
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.ethertype = ethertype;
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(MIN_FRAME_SIZE + self.payload.len());
        buffer.extend_from_slice(&self.dst.0);
        buffer.extend_from_slice(&self.src.0);
        buffer.extend_from_slice(&self.ethertype.to_be_bytes());
        buffer.extend_from_slice(&self.payload);
        buffer
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
