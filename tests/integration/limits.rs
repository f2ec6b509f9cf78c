use relaytun::{DropReason, InboundOutcome, TunnelError};
use relaytun_core::wire::{CIPHERTEXT_CHUNK_LEN, ENVELOPE_HEADER};
use relaytun_core::{textsafe, Packet, PacketError, PacketKind, PacketRegistry, TunnelConfig};

use crate::*;

/// Extra bytes short of a whole ciphertext chunk are ignored on receipt.
#[test]
fn test_partial_trailing_chunk_is_tolerated() {
    let (_hub, alice_node, mut bob_node) = alice_and_bob();
    let packet = Packet::connect_four_piece(&alice(), 0);
    alice_node.tunnel.send_packet(&packet, &bob()).unwrap();
    let envelope = bob_node.drain().remove(0);

    let payload = envelope.text.strip_prefix(ENVELOPE_HEADER).unwrap();
    let mut ciphertext = textsafe::decode(payload).unwrap();
    assert_eq!(ciphertext.len() % CIPHERTEXT_CHUNK_LEN, 0);
    ciphertext.extend_from_slice(&[0x5a; CIPHERTEXT_CHUNK_LEN - 1]);
    let padded = format!("{ENVELOPE_HEADER}{}", textsafe::encode(&ciphertext));

    assert_eq!(
        bob_node.tunnel.on_text(&padded, &alice()),
        InboundOutcome::Dispatched(PacketKind::PutConnectFourPiece)
    );
    assert_eq!(bob_node.received(), vec![packet]);
}

/// An envelope over the relay budget fails before the relay is touched.
#[test]
fn test_over_budget_envelope_is_not_sent() {
    let mut config = TunnelConfig::default();
    config.relay.max_message_len = 100;
    let (_hub, alice_node, mut bob_node) = alice_and_bob_with(config);

    let err = alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "hi"), &bob())
        .unwrap_err();

    assert!(matches!(err, TunnelError::MessageTooLong { max: 100, .. }));
    assert!(bob_node.drain().is_empty());
    assert_eq!(alice_node.tunnel.pending_echoes(), 0);
}

/// The default budget fits a single-chunk envelope addressed to a short name.
#[test]
fn test_single_chunk_fits_default_budget() {
    let (_hub, alice_node, mut bob_node) = alice_and_bob();
    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "a reasonably short line"), &bob())
        .unwrap();
    let envelope = bob_node.drain().remove(0);
    let whisper_len = "w Bob ".len() + envelope.text.chars().count();
    assert!(whisper_len <= TunnelConfig::default().relay.max_message_len);
}

/// A packet that compresses past one RSA block travels as several chunks,
/// and comes out whole when the relay budget lets it through.
#[test]
fn test_multi_chunk_envelope_round_trips() {
    let mut config = TunnelConfig::default();
    config.relay.max_message_len = 4096;
    let (_hub, mut alice_node, mut bob_node) = alice_and_bob_with(config);

    // Pseudo-random ideographs barely compress.
    let mut state = 0x9e37_79b9_u32;
    let noisy: String = (0..200)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            char::from_u32(0x4e00 + state % 0x5000).unwrap()
        })
        .collect();
    let packet = Packet::message(&alice(), noisy);
    alice_node.tunnel.send_packet(&packet, &bob()).unwrap();

    let envelope = bob_node.drain().remove(0);
    let payload = envelope.text.strip_prefix(ENVELOPE_HEADER).unwrap();
    let ciphertext = textsafe::decode(payload).unwrap();
    assert_eq!(ciphertext.len() % CIPHERTEXT_CHUNK_LEN, 0);
    assert!(ciphertext.len() >= 2 * CIPHERTEXT_CHUNK_LEN);

    assert_eq!(
        bob_node.tunnel.on_text(&envelope.text, &envelope.sender),
        InboundOutcome::Dispatched(PacketKind::Message)
    );
    assert_eq!(bob_node.received(), vec![packet]);
    assert_eq!(alice_node.pump(), vec![InboundOutcome::Echo]);
}

/// A receiver that does not know a variant drops it instead of guessing.
#[test]
fn test_unknown_packet_type_is_dropped() {
    let hub = relaytun::RelayHub::new(256, "w");
    let alice_node = Node::join(&hub, alice(), &[bob()], TunnelConfig::default());

    let mut chat_only = PacketRegistry::new();
    chat_only
        .register_body::<relaytun_core::packet::MessagePacket>(0)
        .unwrap();
    let mut bob_node =
        Node::join_with_registry(&hub, bob(), &[alice()], TunnelConfig::default(), chat_only);

    alice_node
        .tunnel
        .send_packet(&Packet::tic_tac_toe_mark(&alice(), 2, 2), &bob())
        .unwrap();
    alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "still there?"), &bob())
        .unwrap();

    assert_eq!(
        bob_node.pump(),
        vec![
            InboundOutcome::Dropped(DropReason::Decode(PacketError::UnknownPacketType(2))),
            InboundOutcome::Dispatched(PacketKind::Message),
        ]
    );
    assert_eq!(bob_node.received().len(), 1);
}

/// The sender refuses variants its registry does not know.
#[test]
fn test_unregistered_variant_cannot_be_sent() {
    let hub = relaytun::RelayHub::new(256, "w");
    let alice_node = Node::join_with_registry(
        &hub,
        alice(),
        &[bob()],
        TunnelConfig::default(),
        PacketRegistry::new(),
    );

    let err = alice_node
        .tunnel
        .send_packet(&Packet::message(&alice(), "hi"), &bob())
        .unwrap_err();
    assert!(matches!(err, TunnelError::UnknownPacketType(PacketKind::Message)));
}
