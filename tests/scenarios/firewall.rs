//! Firewall filtering in front of learning

use super::harness::{arp_in, firewall, ipv4_in, session, HOST_A, HOST_B};
use learnswitch::dataplane::{Handled, SwitchHandler};
use learnswitch::protocol::PortNo;
use std::net::Ipv4Addr;

const BLOCKED: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 66);
const SERVER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

#[test]
fn test_blacklisted_source_is_invisible() {
    let (mut s, conn) = session(firewall(&["10.0.0.66"], &[]));

    let handled = s
        .on_packet_in(ipv4_in(HOST_A, HOST_B, 1, BLOCKED, SERVER))
        .unwrap();

    assert_eq!(handled, Handled::Denied);
    assert!(conn.sent().is_empty());
    assert!(s.table().is_empty());
}

#[test]
fn test_blacklisted_destination_is_denied() {
    let (mut s, conn) = session(firewall(&["10.0.0.0/24"], &[]));

    let handled = s
        .on_packet_in(ipv4_in(HOST_A, HOST_B, 1, Ipv4Addr::new(192, 0, 2, 1), SERVER))
        .unwrap();
    assert_eq!(handled, Handled::Denied);
    assert!(conn.sent().is_empty());
}

#[test]
fn test_whitelist_overrides_blacklist() {
    let (mut s, conn) = session(firewall(&["10.0.0.0/24"], &["10.0.0.2"]));

    let handled = s
        .on_packet_in(ipv4_in(HOST_A, HOST_B, 1, BLOCKED, SERVER))
        .unwrap();

    assert!(matches!(handled, Handled::Forwarded(_)));
    assert_eq!(conn.sent().len(), 1);
    assert_eq!(s.table().lookup(&HOST_A), Some(PortNo(1)));
}

#[test]
fn test_arp_passes_blacklist() {
    let (mut s, conn) = session(firewall(&["0.0.0.0/0"], &[]));

    let handled = s.on_packet_in(arp_in(HOST_A, HOST_B, 1)).unwrap();
    assert!(matches!(handled, Handled::Forwarded(_)));
    assert_eq!(conn.sent().len(), 1);
}

#[test]
fn test_denied_frames_do_not_disturb_learning() {
    let (mut s, conn) = session(firewall(&["10.0.0.66"], &[]));

    s.on_packet_in(arp_in(HOST_B, HOST_A, 2)).unwrap();
    // Would move B to port 5 if it were learned
    s.on_packet_in(ipv4_in(HOST_B, HOST_A, 5, BLOCKED, SERVER))
        .unwrap();

    assert_eq!(s.table().lookup(&HOST_B), Some(PortNo(2)));
    assert_eq!(conn.sent().len(), 1);
}
