//! Metrics collection for forwarding statistics.
//!
//! Thread-safe counters tracked globally and per connected device.

use crate::protocol::openflow::Dpid;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-device statistics.
#[derive(Debug, Default)]
pub struct DeviceStats {
    /// Packet-in notifications received.
    pub packets_in: Counter,
    /// Frames denied by the firewall.
    pub denied: Counter,
    /// Flow rules installed.
    pub rules_installed: Counter,
    /// One-shot packet sends.
    pub packets_out: Counter,
    /// Addresses currently in the device's table.
    pub learned_addresses: AtomicU64,
}

/// Global metrics registry for the controller.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    devices: RwLock<BTreeMap<Dpid, DeviceStats>>,

    /// Packet-in notifications received.
    pub packets_in: Counter,
    /// Frames denied by the firewall.
    pub denied: Counter,
    /// Frames dropped because the destination sits behind the ingress port.
    pub dropped: Counter,
    /// Frames flooded (multicast or unknown destination).
    pub flooded: Counter,
    /// Flow rules installed.
    pub rules_installed: Counter,
    /// One-shot packet sends.
    pub packets_out: Counter,
    /// Packet-in frames too short to carry Ethernet addresses.
    pub rx_errors: Counter,
    /// Instructions the connection failed to deliver.
    pub send_errors: Counter,
    /// Open device sessions.
    pub sessions_active: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Dpid, DeviceStats>> {
        self.devices.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Dpid, DeviceStats>> {
        self.devices.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a device when its session opens.
    pub fn session_opened(&self, dpid: Dpid) {
        self.write().insert(dpid, DeviceStats::default());
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Forgets a device when its session closes.
    pub fn session_closed(&self, dpid: Dpid) {
        if self.write().remove(&dpid).is_some() {
            self.sessions_active.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn record_packet_in(&self, dpid: Dpid) {
        self.packets_in.inc();
        if let Some(stats) = self.read().get(&dpid) {
            stats.packets_in.inc();
        }
    }

    pub fn record_denied(&self, dpid: Dpid) {
        self.denied.inc();
        if let Some(stats) = self.read().get(&dpid) {
            stats.denied.inc();
        }
    }

    pub fn record_rule_installed(&self, dpid: Dpid) {
        self.rules_installed.inc();
        if let Some(stats) = self.read().get(&dpid) {
            stats.rules_installed.inc();
        }
    }

    pub fn record_packet_out(&self, dpid: Dpid) {
        self.packets_out.inc();
        if let Some(stats) = self.read().get(&dpid) {
            stats.packets_out.inc();
        }
    }

    /// Updates the learned-address gauge of a device.
    pub fn set_learned_addresses(&self, dpid: Dpid, count: usize) {
        if let Some(stats) = self.read().get(&dpid) {
            stats.learned_addresses.store(count as u64, Ordering::Relaxed);
        }
    }

    /// Learned addresses summed over open sessions.
    pub fn learned_addresses(&self) -> u64 {
        self.read()
            .values()
            .map(|s| s.learned_addresses.load(Ordering::Relaxed))
            .sum()
    }

    /// Exports all metrics as key-value pairs.
    pub fn export(&self) -> Vec<(String, u64)> {
        let mut result = vec![
            ("packets_in".into(), self.packets_in.get()),
            ("denied".into(), self.denied.get()),
            ("dropped".into(), self.dropped.get()),
            ("flooded".into(), self.flooded.get()),
            ("rules_installed".into(), self.rules_installed.get()),
            ("packets_out".into(), self.packets_out.get()),
            ("rx_errors".into(), self.rx_errors.get()),
            ("send_errors".into(), self.send_errors.get()),
            (
                "sessions_active".into(),
                self.sessions_active.load(Ordering::Relaxed),
            ),
            ("learned_addresses".into(), self.learned_addresses()),
        ];

        for (dpid, stats) in self.read().iter() {
            result.extend([
                (format!("dpid_{:016x}_packets_in", dpid), stats.packets_in.get()),
                (format!("dpid_{:016x}_denied", dpid), stats.denied.get()),
                (
                    format!("dpid_{:016x}_rules_installed", dpid),
                    stats.rules_installed.get(),
                ),
                (format!("dpid_{:016x}_packets_out", dpid), stats.packets_out.get()),
                (
                    format!("dpid_{:016x}_learned_addresses", dpid),
                    stats.learned_addresses.load(Ordering::Relaxed),
                ),
            ]);
        }

        result
    }
}
