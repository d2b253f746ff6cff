//! IPv4 protocol - RFC 791

use crate::{Error, Result};
use std::net::Ipv4Addr;

/// Minimum IPv4 header size (without options)
pub const MIN_HEADER_SIZE: usize = 20;

const DEFAULT_TTL: u8 = 64;

/// Parsed IPv4 header (zero-copy reference)
#[derive(Debug)]
pub struct Ipv4Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv4Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
            return Err(Error::Parse("IPv4 header too short".into()));
        }

        if buffer[0] >> 4 != 4 {
            return Err(Error::Parse("not an IPv4 packet".into()));
        }

        let header_len = (buffer[0] & 0x0F) as usize * 4;
        if header_len < MIN_HEADER_SIZE {
            return Err(Error::Parse(format!("invalid IHL ({} bytes)", header_len)));
        }
        if buffer.len() < header_len {
            return Err(Error::Parse("IPv4 header truncated".into()));
        }

        Ok(Self { buffer })
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.buffer[12],
            self.buffer[13],
            self.buffer[14],
            self.buffer[15],
        )
    }

    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.buffer[16],
            self.buffer[17],
            self.buffer[18],
            self.buffer[19],
        )
    }
}

/// Internet checksum over an IPv4 header
fn checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]) as u32)
        .sum();

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !(sum as u16)
}

/// Builder for header-only IPv4 packets
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    src_addr: Ipv4Addr,
    dst_addr: Ipv4Addr,
}

impl Ipv4Builder {
    pub fn new() -> Self {
        Self {
            src_addr: Ipv4Addr::UNSPECIFIED,
            dst_addr: Ipv4Addr::UNSPECIFIED,
        }
    }

    pub fn src_addr(mut self, addr: Ipv4Addr) -> Self {
        self.src_addr = addr;
        self
    }

    pub fn dst_addr(mut self, addr: Ipv4Addr) -> Self {
        self.dst_addr = addr;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let total_len = MIN_HEADER_SIZE as u16;
        let mut buffer = Vec::with_capacity(MIN_HEADER_SIZE);

        buffer.push(0x45);
        buffer.push(0);
        buffer.extend_from_slice(&total_len.to_be_bytes());
        // identification, flags (DF) and fragment offset
        buffer.extend_from_slice(&[0, 0, 0x40, 0]);
        buffer.extend_from_slice(&[DEFAULT_TTL, 0]);
        buffer.extend_from_slice(&[0, 0]);
        buffer.extend_from_slice(&self.src_addr.octets());
        buffer.extend_from_slice(&self.dst_addr.octets());

        let sum = checksum(&buffer);
        buffer[10..12].copy_from_slice(&sum.to_be_bytes());
        buffer
    }
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self::new()
    }
}
