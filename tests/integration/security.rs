use relaytun::{DropReason, InboundOutcome, RelayMessage};
use relaytun_core::{Packet, TunnelConfig};

use crate::*;

/// Mallory encrypts a packet for Bob that claims to come from Alice. The
/// relay reports Mallory as the author, so Bob never dispatches it.
#[test]
fn test_forged_sender_is_never_dispatched() {
    let (hub, _alice_node, mut bob_node) = alice_and_bob();
    let mallory_node = Node::join(&hub, mallory(), &[bob()], TunnelConfig::default());

    let forged = Packet::message(&alice(), "send me your password");
    mallory_node.tunnel.send_packet(&forged, &bob()).unwrap();

    assert_eq!(
        bob_node.pump(),
        vec![InboundOutcome::Dropped(DropReason::SenderMismatch)]
    );
    assert!(bob_node.received().is_empty());
}

/// Every peer may see every envelope. Only the addressee can open one.
#[test]
fn test_bystander_cannot_read_envelope() {
    let (hub, alice_node, mut bob_node) = alice_and_bob();
    let mallory_node = Node::join(&hub, mallory(), &[alice()], TunnelConfig::default());

    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "for bob"), &bob())
        .unwrap();
    let envelope = bob_node.drain().remove(0);

    // Hand Bob's envelope to Mallory as if she had overheard it.
    assert_eq!(
        mallory_node.tunnel.on_text(&envelope.text, &envelope.sender),
        InboundOutcome::Dropped(DropReason::Decrypt)
    );
    assert!(mallory_node.received().is_empty());
}

/// The relay's echo of our own envelope is consumed by the echo filter and
/// never reaches decryption or authentication.
#[test]
fn test_own_echo_is_suppressed() {
    let (_hub, mut alice_node, _bob_node) = alice_and_bob();

    alice_node
        .tunnel
        .send_packet(&Packet::tic_tac_toe_mark(&alice(), 1, 1), &bob())
        .unwrap();
    assert_eq!(alice_node.tunnel.pending_echoes(), 1);

    assert_eq!(alice_node.pump(), vec![InboundOutcome::Echo]);
    assert_eq!(alice_node.tunnel.pending_echoes(), 0);
    assert!(alice_node.received().is_empty());
}

/// A second delivery of the same envelope is not mistaken for an echo, and
/// it is handled exactly like any other message not addressed to us.
#[test]
fn test_replayed_echo_is_not_swallowed_twice() {
    let (_hub, mut alice_node, _bob_node) = alice_and_bob();

    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "once"), &bob())
        .unwrap();
    let echo = alice_node.drain().remove(0);

    let first = alice_node.tunnel.on_text(&echo.text, &echo.sender);
    let second = alice_node.tunnel.on_text(&echo.text, &echo.sender);
    assert_eq!(first, InboundOutcome::Echo);
    assert_eq!(second, InboundOutcome::Dropped(DropReason::Decrypt));
}

/// Bob's envelope, replayed into Bob's inbox under Mallory's name, is
/// rejected even though it decrypts.
#[test]
fn test_relabelled_envelope_fails_authentication() {
    let (_hub, alice_node, mut bob_node) = alice_and_bob();

    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "hi"), &bob())
        .unwrap();
    let RelayMessage { text, .. } = bob_node.drain().remove(0);

    assert_eq!(
        bob_node.tunnel.on_text(&text, &mallory()),
        InboundOutcome::Dropped(DropReason::SenderMismatch)
    );
    assert!(bob_node.received().is_empty());
}
