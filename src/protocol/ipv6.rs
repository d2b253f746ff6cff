//! IPv6 protocol - RFC 8200

use crate::{Error, Result};
use std::net::Ipv6Addr;

/// IPv6 header size (fixed, unlike IPv4)
pub const HEADER_SIZE: usize = 40;

/// "No Next Header"
const NO_NEXT_HEADER: u8 = 59;
const DEFAULT_HOP_LIMIT: u8 = 64;

/// Parsed IPv6 header (zero-copy reference)
#[derive(Debug)]
pub struct Ipv6Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        if buffer.len() < HEADER_SIZE {
            return Err(Error::Parse("IPv6 header too short".into()));
        }

        if buffer[0] >> 4 != 6 {
            return Err(Error::Parse("not an IPv6 packet".into()));
        }

        Ok(Self { buffer })
    }

    pub fn src_addr(&self) -> Ipv6Addr {
        addr_at(self.buffer, 8)
    }

    pub fn dst_addr(&self) -> Ipv6Addr {
        addr_at(self.buffer, 24)
    }
}

fn addr_at(buffer: &[u8], offset: usize) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&buffer[offset..offset + 16]);
    Ipv6Addr::from(octets)
}

/// Builder for header-only IPv6 packets
#[derive(Debug, Clone)]
pub struct Ipv6Builder {
    src_addr: Ipv6Addr,
    dst_addr: Ipv6Addr,
}

impl Ipv6Builder {
    pub fn new() -> Self {
        Self {
            src_addr: Ipv6Addr::UNSPECIFIED,
            dst_addr: Ipv6Addr::UNSPECIFIED,
        }
    }

    pub fn src_addr(mut self, addr: Ipv6Addr) -> Self {
        self.src_addr = addr;
        self
    }

    pub fn dst_addr(mut self, addr: Ipv6Addr) -> Self {
        self.dst_addr = addr;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        // version 6, zero payload length
        buffer.extend_from_slice(&[0x60, 0, 0, 0, 0, 0]);
        buffer.push(NO_NEXT_HEADER);
        buffer.push(DEFAULT_HOP_LIMIT);
        buffer.extend_from_slice(&self.src_addr.octets());
        buffer.extend_from_slice(&self.dst_addr.octets());
        buffer
    }
}

impl Default for Ipv6Builder {
    fn default() -> Self {
        Self::new()
    }
}
