//! Address-list firewall
//!
//! Classifies the network-layer packet carried by a frame against a
//! blacklist and a whitelist of IP prefixes. Only IPv4 and IPv6 are
//! inspected; everything else passes.
//!
//! A packet matches a list when its source or destination address falls in
//! any prefix of that list. The whitelist takes precedence: a packet is
//! denied only when it matches the blacklist and not the whitelist.

use crate::config::FirewallConfig;
use crate::protocol::ipv4::Ipv4Header;
use crate::protocol::ipv6::Ipv6Header;
use crate::protocol::EtherType;
use crate::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{trace, warn};

/// Firewall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny,
}

/// IPv4 or IPv6 prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpPrefix {
    V4 { network: Ipv4Addr, prefix_len: u8 },
    V6 { network: Ipv6Addr, prefix_len: u8 },
}

impl IpPrefix {
    /// Parse "192.0.2.1", "192.0.2.0/24", "2001:db8::1" or "2001:db8::/32"
    ///
    /// A bare address is a host prefix.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (addr, prefix_len) = match s.split_once('/') {
            Some((addr, len)) => (addr.parse::<IpAddr>().ok()?, Some(len.parse::<u8>().ok()?)),
            None => (s.parse::<IpAddr>().ok()?, None),
        };

        match addr {
            IpAddr::V4(a) => {
                let len = prefix_len.unwrap_or(32);
                if len > 32 {
                    return None;
                }
                Some(IpPrefix::V4 {
                    network: Ipv4Addr::from(u32::from(a) & v4_mask(len)),
                    prefix_len: len,
                })
            }
            IpAddr::V6(a) => {
                let len = prefix_len.unwrap_or(128);
                if len > 128 {
                    return None;
                }
                Some(IpPrefix::V6 {
                    network: Ipv6Addr::from(u128::from(a) & v6_mask(len)),
                    prefix_len: len,
                })
            }
        }
    }

    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self, addr) {
            (IpPrefix::V4 { network, prefix_len }, IpAddr::V4(a)) => {
                u32::from(a) & v4_mask(*prefix_len) == u32::from(*network)
            }
            (IpPrefix::V6 { network, prefix_len }, IpAddr::V6(a)) => {
                u128::from(a) & v6_mask(*prefix_len) == u128::from(*network)
            }
            _ => false,
        }
    }
}

fn v4_mask(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !0u32 << (32 - prefix_len)
    }
}

fn v6_mask(prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        0
    } else {
        !0u128 << (128 - prefix_len)
    }
}

fn parse_list(name: &str, entries: &[String]) -> Result<Vec<IpPrefix>> {
    entries
        .iter()
        .map(|entry| {
            IpPrefix::parse(entry)
                .ok_or_else(|| Error::Config(format!("{}: invalid address '{}'", name, entry)))
        })
        .collect()
}

/// Blacklist/whitelist filter, immutable once built
#[derive(Debug, Clone, Default)]
pub struct FirewallFilter {
    blacklist: Vec<IpPrefix>,
    whitelist: Vec<IpPrefix>,
}

impl FirewallFilter {
    pub fn new(config: &FirewallConfig) -> Result<Self> {
        Ok(Self {
            blacklist: parse_list("blacklist", &config.blacklist)?,
            whitelist: parse_list("whitelist", &config.whitelist)?,
        })
    }

    /// True when no packet can ever be denied
    pub fn is_permissive(&self) -> bool {
        self.blacklist.is_empty()
    }

    /// Classify the packet carried by a frame of the given EtherType
    ///
    /// Non-IP payloads are allowed. Malformed IP headers are allowed and
    /// logged.
    pub fn classify(&self, ethertype: u16, payload: &[u8]) -> Verdict {
        if self.is_permissive() {
            return Verdict::Allow;
        }

        let addrs = match EtherType::from_u16(ethertype) {
            Some(EtherType::Ipv4) => Ipv4Header::parse(payload)
                .map(|h| (IpAddr::V4(h.src_addr()), IpAddr::V4(h.dst_addr()))),
            Some(EtherType::Ipv6) => Ipv6Header::parse(payload)
                .map(|h| (IpAddr::V6(h.src_addr()), IpAddr::V6(h.dst_addr()))),
            _ => {
                trace!("ethertype 0x{:04x} not filtered", ethertype);
                return Verdict::Allow;
            }
        };

        match addrs {
            Ok((src, dst)) => self.classify_addrs(src, dst),
            Err(e) => {
                warn!("Passing unparseable IP packet: {}", e);
                Verdict::Allow
            }
        }
    }

    /// Classify by source and destination address
    pub fn classify_addrs(&self, src: IpAddr, dst: IpAddr) -> Verdict {
        let matches = |list: &[IpPrefix]| {
            list.iter()
                .any(|prefix| prefix.contains(src) || prefix.contains(dst))
        };

        if matches(&self.blacklist) && !matches(&self.whitelist) {
            Verdict::Deny
        } else {
            Verdict::Allow
        }
    }
}
