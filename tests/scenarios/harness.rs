//! Shared helpers: a recording connection and frame constructors

use learnswitch::config::{FirewallConfig, FlowConfig};
use learnswitch::dataplane::{Connection, DeviceSession, FirewallFilter};
use learnswitch::protocol::ethernet::FrameBuilder;
use learnswitch::protocol::ipv4::Ipv4Builder;
use learnswitch::protocol::openflow::{Instruction, PacketIn};
use learnswitch::protocol::{EtherType, MacAddr};
use learnswitch::telemetry::MetricsRegistry;
use learnswitch::Result;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

pub const HOST_A: MacAddr = MacAddr([0x00, 0x00, 0x00, 0x00, 0x00, 0xaa]);
pub const HOST_B: MacAddr = MacAddr([0x00, 0x00, 0x00, 0x00, 0x00, 0xbb]);

/// Connection recording every instruction, cloneable so the test keeps a view
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Instruction>>>);

impl Recorder {
    pub fn sent(&self) -> Vec<Instruction> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl Connection for Recorder {
    fn send(&mut self, instruction: Instruction) -> Result<()> {
        self.0.lock().unwrap().push(instruction);
        Ok(())
    }
}

pub fn session(firewall: FirewallFilter) -> (DeviceSession<Recorder>, Recorder) {
    let recorder = Recorder::default();
    let session = DeviceSession::new(
        1,
        recorder.clone(),
        Arc::new(firewall),
        FlowConfig::default(),
        Arc::new(MetricsRegistry::new()),
    );
    (session, recorder)
}

pub fn firewall(blacklist: &[&str], whitelist: &[&str]) -> FirewallFilter {
    FirewallFilter::new(&FirewallConfig {
        blacklist: blacklist.iter().map(|s| s.to_string()).collect(),
        whitelist: whitelist.iter().map(|s| s.to_string()).collect(),
    })
    .unwrap()
}

pub fn arp_in(src: MacAddr, dst: MacAddr, port: u16) -> PacketIn {
    let data = FrameBuilder::new()
        .src_mac(src)
        .dst_mac(dst)
        .ethertype(EtherType::Arp as u16)
        .payload(&[0u8; 28])
        .build();
    PacketIn::new(port, Some(u32::from(port)), data)
}

pub fn ipv4_in(
    src: MacAddr,
    dst: MacAddr,
    port: u16,
    ip_src: Ipv4Addr,
    ip_dst: Ipv4Addr,
) -> PacketIn {
    let ip = Ipv4Builder::new().src_addr(ip_src).dst_addr(ip_dst).build();
    let data = FrameBuilder::new()
        .src_mac(src)
        .dst_mac(dst)
        .payload(&ip)
        .build();
    PacketIn::new(port, None, data)
}
