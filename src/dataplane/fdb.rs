//! Forwarding Database (MAC address table)
//!
//! One table per connected device, mapping each learned hardware address to
//! the port it was last seen on. Entries never age out on the controller
//! side; expiry is delegated to the timeouts of the rules installed on the
//! device, and the whole table is dropped with its session.

use crate::protocol::{MacAddr, PortNo};
use std::collections::HashMap;

/// Learned address -> port mapping of a single device
#[derive(Debug, Default, Clone)]
pub struct AddressTable {
    entries: HashMap<MacAddr, PortNo>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `mac` was last seen on `port`
    ///
    /// Last writer wins: a later observation on another port overwrites the
    /// earlier mapping. Returns the previous port when the address moved.
    pub fn learn(&mut self, mac: MacAddr, port: PortNo) -> Option<PortNo> {
        self.entries
            .insert(mac, port)
            .filter(|previous| *previous != port)
    }

    /// Port the address was last seen on
    pub fn lookup(&self, mac: &MacAddr) -> Option<PortNo> {
        self.entries.get(mac).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
