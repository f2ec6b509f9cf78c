use relaytun::InboundOutcome;
use relaytun_core::wire::ENVELOPE_HEADER;
use relaytun_core::{GameKind, Packet, PacketKind, Peer};
use uuid::Uuid;

use crate::*;

/// A chat line from Alice arrives at Bob exactly once, as sent.
#[test]
fn test_chat_message_end_to_end() {
    let (_hub, alice_node, mut bob_node) = alice_and_bob();
    let packet = Packet::message(&alice(), "hi");

    alice_node.tunnel.send_packet(&packet, &bob()).unwrap();

    let delivered = bob_node.drain();
    assert_eq!(delivered.len(), 1);
    assert!(delivered[0].text.starts_with(ENVELOPE_HEADER));
    assert_eq!(delivered[0].sender, alice());

    let outcome = bob_node.tunnel.on_text(&delivered[0].text, &delivered[0].sender);
    assert_eq!(outcome, InboundOutcome::Dispatched(PacketKind::Message));
    assert_eq!(bob_node.received(), vec![packet]);
}

/// Every packet variant survives the whole pipeline unchanged.
#[test]
fn test_every_variant_round_trips() {
    let (_hub, mut alice_node, mut bob_node) = alice_and_bob();
    let packets = vec![
        Packet::message(&alice(), "good game?"),
        Packet::start_game(&alice(), GameKind::TicTacToe, false),
        Packet::start_game(&alice(), GameKind::ConnectFour, true),
        Packet::tic_tac_toe_mark(&alice(), 0, 2),
        Packet::connect_four_piece(&alice(), 6),
    ];

    for packet in &packets {
        alice_node.tunnel.send_packet(packet, &bob()).unwrap();
    }

    let outcomes = bob_node.pump();
    assert_eq!(outcomes.len(), packets.len());
    for (outcome, packet) in outcomes.iter().zip(&packets) {
        assert_eq!(*outcome, InboundOutcome::Dispatched(packet.kind()));
    }
    assert_eq!(bob_node.received(), packets);

    // Alice sees only her own echoes, and swallows all of them.
    let echoes = alice_node.pump();
    assert_eq!(echoes, vec![InboundOutcome::Echo; packets.len()]);
    assert!(alice_node.received().is_empty());
    assert_eq!(alice_node.tunnel.pending_echoes(), 0);
}

/// Both peers can talk at once without confusing each other's echoes.
#[test]
fn test_conversation_in_both_directions() {
    let (_hub, mut alice_node, mut bob_node) = alice_and_bob();

    alice_node
        .tunnel
        .send_packet(&Packet::start_game(&alice(), GameKind::ConnectFour, false), &bob())
        .unwrap();
    bob_node
        .tunnel
        .send_packet(&Packet::start_game(&bob(), GameKind::ConnectFour, true), &alice())
        .unwrap();
    bob_node
        .tunnel
        .send_packet(&Packet::connect_four_piece(&bob(), 3), &alice())
        .unwrap();

    let at_alice = alice_node.pump();
    let at_bob = bob_node.pump();

    assert_eq!(
        at_alice,
        vec![
            InboundOutcome::Echo,
            InboundOutcome::Dispatched(PacketKind::StartTwoPlayerGame),
            InboundOutcome::Dispatched(PacketKind::PutConnectFourPiece),
        ]
    );
    assert_eq!(
        at_bob,
        vec![
            InboundOutcome::Dispatched(PacketKind::StartTwoPlayerGame),
            InboundOutcome::Echo,
            InboundOutcome::Echo,
        ]
    );
    assert_eq!(alice_node.received().len(), 2);
    assert_eq!(bob_node.received().len(), 1);
}

/// Ordinary relay chat passes through untouched.
#[test]
fn test_plain_chat_is_not_tunnel_traffic() {
    let (hub, mut alice_node, _bob_node) = alice_and_bob();
    let (carol_relay, _carol_rx) = hub.join(Peer::new("Carol", Uuid::from_u128(0xca201)));

    use relaytun::Relay;
    carol_relay.send_text("anyone up for a game").unwrap();

    assert_eq!(alice_node.pump(), vec![InboundOutcome::NotTunnel]);
    assert!(alice_node.received().is_empty());
}

/// A peer can whisper a packet to itself: one copy is the echo, the other
/// is a real delivery.
#[test]
fn test_packet_to_self_is_delivered_once() {
    let hub = relaytun::RelayHub::new(256, "w");
    let mut alice_node = Node::join(&hub, alice(), &[alice()], Default::default());

    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "note to self"), &alice())
        .unwrap();

    let outcomes = alice_node.pump();
    assert_eq!(
        outcomes,
        vec![
            InboundOutcome::Echo,
            InboundOutcome::Dispatched(PacketKind::Message)
        ]
    );
    assert_eq!(alice_node.received().len(), 1);
}
