//! Determinism of the session pipeline and trace replay

use super::harness::{arp_in, session, HOST_A, HOST_B};
use learnswitch::config::FlowConfig;
use learnswitch::controller::{replay, Controller, Trace};
use learnswitch::dataplane::{FirewallFilter, SwitchHandler};
use learnswitch::protocol::MacAddr;
use learnswitch::telemetry::MetricsRegistry;
use std::sync::Arc;

#[test]
fn test_identical_history_identical_instructions() {
    let history = [
        arp_in(HOST_A, MacAddr::BROADCAST, 1),
        arp_in(HOST_B, HOST_A, 2),
        arp_in(HOST_A, HOST_B, 1),
        arp_in(HOST_A, HOST_B, 2),
    ];

    let (mut first, first_conn) = session(FirewallFilter::default());
    let (mut second, second_conn) = session(FirewallFilter::default());
    for event in &history {
        let a = first.on_packet_in(event.clone()).unwrap();
        let b = second.on_packet_in(event.clone()).unwrap();
        assert_eq!(a, b);
    }

    assert_eq!(first_conn.sent(), second_conn.sent());
}

#[test]
fn test_same_packet_in_twice_same_outcome() {
    let (mut s, conn) = session(FirewallFilter::default());
    s.on_packet_in(arp_in(HOST_B, HOST_A, 2)).unwrap();

    let event = arp_in(HOST_A, HOST_B, 1);
    let first = s.on_packet_in(event.clone()).unwrap();
    let second = s.on_packet_in(event).unwrap();
    assert_eq!(first, second);

    let sent = conn.sent();
    assert_eq!(sent[sent.len() - 2], sent[sent.len() - 1]);
}

const TRACE: &str = r#"
[[event]]
kind = "connection_up"
dpid = 1

[[event]]
kind = "packet_in"
dpid = 1
in_port = 1
src = "00:00:00:00:00:aa"
dst = "00:00:00:00:00:bb"

[[event]]
kind = "packet_in"
dpid = 1
in_port = 2
src = "00:00:00:00:00:bb"
dst = "00:00:00:00:00:aa"

[[event]]
kind = "packet_in"
dpid = 1
in_port = 3
src = "00:00:00:00:00:cc"
dst = "00:00:00:00:00:aa"
ip_src = "10.0.0.66"
ip_dst = "10.0.0.1"

[[event]]
kind = "packet_in"
dpid = 9
in_port = 1
src = "00:00:00:00:00:aa"
dst = "00:00:00:00:00:bb"

[[event]]
kind = "connection_down"
dpid = 1
"#;

#[tokio::test]
async fn test_replay_trace() {
    let trace = Trace::parse(TRACE).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());
    let firewall = super::harness::firewall(&["10.0.0.66"], &[]);
    let mut controller = Controller::new(firewall, FlowConfig::default(), metrics.clone());

    replay(&mut controller, &trace).await.unwrap();

    assert_eq!(controller.session_count(), 0);
    // The packet-in for device 9 never reaches a session
    assert_eq!(metrics.packets_in.get(), 3);
    assert_eq!(metrics.denied.get(), 1);
    assert_eq!(metrics.packets_out.get(), 1);
    assert_eq!(metrics.rules_installed.get(), 1);
    assert_eq!(metrics.flooded.get(), 1);
}

const OPEN_TRACE: &str = r#"
[[event]]
kind = "connection_up"
dpid = 2

[[event]]
kind = "packet_in"
dpid = 2
in_port = 1
src = "00:00:00:00:00:aa"
dst = "00:00:00:00:00:bb"

[[event]]
kind = "packet_in"
dpid = 2
in_port = 4
src = "00:00:00:00:00:bb"
dst = "00:00:00:00:00:aa"
"#;

#[tokio::test]
async fn test_replay_leaves_open_sessions_reportable() {
    let trace = Trace::parse(OPEN_TRACE).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());
    let mut controller = Controller::new(
        FirewallFilter::default(),
        FlowConfig::default(),
        metrics.clone(),
    );

    replay(&mut controller, &trace).await.unwrap();

    assert!(controller.is_connected(2));
    assert_eq!(metrics.learned_addresses(), 2);
    let exported = metrics.export();
    let learned = ("dpid_0000000000000002_learned_addresses".to_string(), 2);
    let installed = ("dpid_0000000000000002_rules_installed".to_string(), 1);
    assert!(exported.contains(&learned));
    assert!(exported.contains(&installed));

    controller.shutdown().await;
    assert_eq!(metrics.learned_addresses(), 0);
}
