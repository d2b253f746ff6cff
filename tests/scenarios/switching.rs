//! Learning and forwarding across a sequence of packet-ins

use super::harness::{arp_in, session, HOST_A, HOST_B};
use learnswitch::dataplane::{
    Decision, FirewallFilter, FloodScope, ForwardingOutcome, Handled, SwitchHandler,
};
use learnswitch::protocol::openflow::{Action, FlowMatch, Instruction};
use learnswitch::protocol::{MacAddr, PortNo};

/// A talks to unknown B, B answers from port 2, then A sends to B from the
/// port B was learned on.
#[test]
fn test_two_host_exchange() {
    let (mut s, conn) = session(FirewallFilter::default());

    let first = s.on_packet_in(arp_in(HOST_A, HOST_B, 1)).unwrap();
    assert_eq!(
        first,
        Handled::Forwarded(ForwardingOutcome {
            decision: Decision::Flood(FloodScope::AllExceptIngress),
            install_rule: false,
        })
    );

    let second = s.on_packet_in(arp_in(HOST_B, HOST_A, 2)).unwrap();
    assert_eq!(
        second,
        Handled::Forwarded(ForwardingOutcome {
            decision: Decision::ForwardToPort(PortNo(1)),
            install_rule: true,
        })
    );

    let third = s.on_packet_in(arp_in(HOST_A, HOST_B, 2)).unwrap();
    assert_eq!(
        third,
        Handled::Forwarded(ForwardingOutcome {
            decision: Decision::Drop,
            install_rule: false,
        })
    );

    let sent = conn.sent();
    assert_eq!(sent.len(), 2);
    match &sent[0] {
        Instruction::PacketOut(out) => {
            assert_eq!(out.in_port, PortNo(1));
            assert_eq!(out.actions, vec![Action::Output(PortNo::FLOOD)]);
        }
        other => panic!("Expected packet_out, got {}", other),
    }
    match &sent[1] {
        Instruction::FlowMod(m) => {
            assert_eq!(
                m.flow_match,
                FlowMatch {
                    in_port: Some(PortNo(2)),
                    dl_src: Some(HOST_B),
                    dl_dst: Some(HOST_A),
                }
            );
            assert_eq!(m.actions, vec![Action::Output(PortNo(1))]);
            assert_eq!((m.idle_timeout, m.hard_timeout), (5, 15));
            assert_eq!(m.packet.buffer_id, Some(2));
        }
        other => panic!("Expected flow_mod, got {}", other),
    }

    // The moved host is now on port 2
    assert_eq!(s.table().lookup(&HOST_A), Some(PortNo(2)));
}

#[test]
fn test_multicast_after_many_learnings() {
    let (mut s, conn) = session(FirewallFilter::default());

    for i in 0..200u16 {
        let host = MacAddr([0x02, 0, 0, 0, (i >> 8) as u8, i as u8]);
        s.on_packet_in(arp_in(host, HOST_A, i % 48 + 1)).unwrap();
    }
    assert_eq!(s.table().len(), 200);
    conn.clear();

    let multicast = MacAddr([0x33, 0x33, 0x00, 0x00, 0x00, 0x01]);
    let handled = s.on_packet_in(arp_in(HOST_B, multicast, 7)).unwrap();
    assert_eq!(
        handled,
        Handled::Forwarded(ForwardingOutcome {
            decision: Decision::Flood(FloodScope::AllPorts),
            install_rule: true,
        })
    );

    let sent = conn.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].output_ports(), vec![PortNo::ALL]);
}

#[test]
fn test_unknown_flood_never_targets_ingress() {
    let (mut s, conn) = session(FirewallFilter::default());

    for port in 1..=8u16 {
        let src = MacAddr([0x02, 0, 0, 0, 0, port as u8]);
        s.on_packet_in(arp_in(src, HOST_B, port)).unwrap();
    }

    for instruction in conn.sent() {
        match instruction {
            Instruction::PacketOut(out) => {
                assert_eq!(out.actions, vec![Action::Output(PortNo::FLOOD)]);
            }
            other => panic!("Expected packet_out, got {}", other),
        }
    }
}
