// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! End-to-end integration tests for didcomm-peer.
//!
//! These tests exercise the full messaging lifecycle from identity
//! creation through envelope delivery. They prove that the crate's core
//! components compose correctly: key generation, peer DID derivation,
//! document resolution, secret storage, packing in every protection
//! mode, and unpacking with verification.
//!
//! Each test stands alone with its own agents and stores. No shared
//! state, no test ordering dependencies, no flaky failures.

use serde_json::Value;

use didcomm_peer::agent::Agent;
use didcomm_peer::config::{NUMALGO_0_PREFIX, NUMALGO_2_PREFIX};
use didcomm_peer::envelope::wire::{Envelope, EnvelopeAlg};
use didcomm_peer::envelope::{PackOptions, UnpackError};
use didcomm_peer::peer::did::{PeerDid, ServiceDescriptor, VerificationKey};
use didcomm_peer::peer::document::{resolve, KeyFormat};
use didcomm_peer::secrets::SecretStore;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A party with one signing and one agreement key, no service endpoint.
fn party() -> (Agent, String) {
    let agent = Agent::new();
    let did = agent
        .create_identity(1, 1, None, Vec::new())
        .expect("identity");
    (agent, did)
}

fn outer_header_alg(packed: &str) -> String {
    Envelope::from_json(packed)
        .expect("envelope")
        .header()
        .expect("header")
        .alg
}

// ---------------------------------------------------------------------------
// Identity lifecycle
// ---------------------------------------------------------------------------

#[test]
fn single_key_and_multi_key_identities_take_different_forms() {
    let agent = Agent::new();

    let inception = agent.create_identity(1, 0, None, Vec::new()).unwrap();
    assert!(inception.starts_with(NUMALGO_0_PREFIX));

    let multi = agent.create_identity(1, 1, None, Vec::new()).unwrap();
    assert!(multi.starts_with(NUMALGO_2_PREFIX));
}

#[test]
fn identity_creation_is_collision_free() {
    let agent = Agent::new();
    let a = agent.create_identity(1, 1, None, Vec::new()).unwrap();
    let b = agent.create_identity(1, 1, None, Vec::new()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn derivation_is_deterministic_in_the_keys() {
    // Same keys, same service, same DID — no hidden randomness.
    let signing = didcomm_peer::crypto::keys::SigningKeypair::from_seed(&[7u8; 32]);
    let agreement = didcomm_peer::crypto::keys::AgreementKeypair::from_seed(&[9u8; 32]);
    let service = ServiceDescriptor::new("https://relay.example/inbox");

    let derive = || {
        PeerDid::derive(
            &[VerificationKey::from_signing(&signing)],
            &[VerificationKey::from_agreement(&agreement)],
            Some(&service),
        )
        .unwrap()
    };
    assert_eq!(derive(), derive());
}

#[test]
fn resolution_inverts_derivation() {
    let agent = Agent::new();
    let did = agent
        .create_identity(2, 2, Some("https://relay.example/inbox"), vec![
            "did:example:mediator#key-1".to_string(),
        ])
        .unwrap();

    let parsed = PeerDid::parse(&did).unwrap();
    let rederived = PeerDid::derive(
        &parsed.auth_keys(),
        &parsed.agreement_keys(),
        parsed.service.as_ref(),
    )
    .unwrap();
    assert_eq!(rederived.as_str(), did);
}

#[test]
fn documents_render_in_all_three_key_formats() {
    let (_, did) = party();

    for format in [KeyFormat::Jwk, KeyFormat::Base58, KeyFormat::Multibase] {
        let document = resolve(&did, format).unwrap();
        assert_eq!(document.id, did);
        assert_eq!(document.authentication.len(), 1);
        assert_eq!(document.key_agreement.len(), 1);

        // Whatever the rendering, the recovered raw keys agree.
        for method in &document.verification_method {
            assert_eq!(method.raw_key().unwrap().len(), 32);
        }
    }
}

#[test]
fn service_endpoint_survives_the_document_roundtrip() {
    let agent = Agent::new();
    let did = agent
        .create_identity(1, 1, Some("https://relay.example/inbox"), vec![
            "did:example:mediator#key-2".to_string(),
        ])
        .unwrap();

    let json = agent.resolve_identity(&did, KeyFormat::Jwk).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let service = &value["service"][0];
    assert_eq!(service["id"], format!("{did}#didcommmessaging-0"));
    assert_eq!(service["type"], "DIDCommMessaging");
    assert_eq!(service["serviceEndpoint"], "https://relay.example/inbox");
    assert_eq!(service["routingKeys"][0], "did:example:mediator#key-2");
    assert_eq!(service["accept"][0], "didcomm/v2");
}

// ---------------------------------------------------------------------------
// Messaging round trips
// ---------------------------------------------------------------------------

#[test]
fn anonymous_message_roundtrip() {
    let (bob, bob_did) = party();

    // Anyone can send anonymously; no sender store involved.
    let sender = Agent::new();
    let packed = sender
        .pack_message("whistle", &bob_did, None, &PackOptions::default())
        .unwrap();

    let (message, from, to) = bob.unpack_message(&packed).unwrap();
    assert_eq!(message.text(), Some("whistle"));
    assert_eq!(from, None);
    assert_eq!(to, bob_did);
}

#[test]
fn authenticated_message_roundtrip() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let packed = alice
        .pack_message("hi", &bob_did, Some(&alice_did), &PackOptions::default())
        .unwrap();
    let (message, from, to) = bob.unpack_message(&packed).unwrap();

    assert_eq!(message.text(), Some("hi"));
    assert_eq!(from.as_deref(), Some(alice_did.as_str()));
    assert_eq!(to, bob_did);

    let detail = bob.unpack_detailed(&packed).unwrap();
    assert!(detail.metadata.authenticated);
    assert!(detail.metadata.anonymous_sender);
    assert!(!detail.metadata.signed);
}

#[test]
fn signed_and_authenticated_roundtrip() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let options = PackOptions {
        sign_by: Some(alice_did.clone()),
        hide_sender: true,
    };
    let packed = alice
        .pack_message("on the record", &bob_did, Some(&alice_did), &options)
        .unwrap();

    let detail = bob.unpack_detailed(&packed).unwrap();
    assert_eq!(detail.message.text(), Some("on the record"));
    assert!(detail.metadata.authenticated);
    assert!(detail.metadata.signed);
    assert!(detail
        .metadata
        .sign_from
        .as_deref()
        .unwrap()
        .starts_with(&alice_did));
}

#[test]
fn signed_but_anonymous_roundtrip() {
    // Non-repudiation without encryption-level sender binding.
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let options = PackOptions {
        sign_by: Some(alice_did.clone()),
        hide_sender: true,
    };
    let packed = alice
        .pack_message("signed tip", &bob_did, None, &options)
        .unwrap();

    let detail = bob.unpack_detailed(&packed).unwrap();
    assert!(!detail.metadata.authenticated);
    assert!(detail.metadata.signed);
    assert_eq!(detail.sender, None);
}

#[test]
fn reply_flows_back_over_fresh_envelopes() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let to_bob = alice
        .pack_message("hello bob", &bob_did, Some(&alice_did), &PackOptions::default())
        .unwrap();
    let (message, from, _) = bob.unpack_message(&to_bob).unwrap();
    assert_eq!(message.text(), Some("hello bob"));

    let to_alice = bob
        .pack_message("hello alice", from.as_deref().unwrap(), Some(&bob_did), &PackOptions::default())
        .unwrap();
    let (reply, reply_from, reply_to) = alice.unpack_message(&to_alice).unwrap();
    assert_eq!(reply.text(), Some("hello alice"));
    assert_eq!(reply_from.as_deref(), Some(bob_did.as_str()));
    assert_eq!(reply_to, alice_did);
}

// ---------------------------------------------------------------------------
// Sender hiding
// ---------------------------------------------------------------------------

#[test]
fn hidden_sender_leaves_no_trace_in_cleartext() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let packed = alice
        .pack_message("quiet", &bob_did, Some(&alice_did), &PackOptions::default())
        .unwrap();

    // The wire-visible layer is anonymous and mentions the sender nowhere.
    assert_eq!(outer_header_alg(&packed), EnvelopeAlg::Anoncrypt.as_str());
    assert!(!packed.contains(&alice_did));

    // Yet the recipient still gets an authenticated sender.
    let detail = bob.unpack_detailed(&packed).unwrap();
    assert!(detail.metadata.authenticated);
    assert_eq!(detail.sender.as_deref(), Some(alice_did.as_str()));
}

#[test]
fn exposed_sender_is_visible_on_the_wire() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let options = PackOptions {
        hide_sender: false,
        ..PackOptions::default()
    };
    let packed = alice
        .pack_message("loud", &bob_did, Some(&alice_did), &options)
        .unwrap();

    assert_eq!(outer_header_alg(&packed), EnvelopeAlg::Authcrypt.as_str());
    let (_, from, _) = bob.unpack_message(&packed).unwrap();
    assert_eq!(from.as_deref(), Some(alice_did.as_str()));
}

#[test]
fn identical_plaintexts_yield_unlinkable_envelopes() {
    let (_, bob_did) = party();
    let sender = Agent::new();

    let a = sender
        .pack_message("same", &bob_did, None, &PackOptions::default())
        .unwrap();
    let b = sender
        .pack_message("same", &bob_did, None, &PackOptions::default())
        .unwrap();
    // Fresh ephemeral key, CEK, and nonce every time.
    assert_ne!(a, b);
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn only_the_addressee_can_read() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();
    let (eve, _) = party();

    let packed = alice
        .pack_message("for bob", &bob_did, Some(&alice_did), &PackOptions::default())
        .unwrap();

    assert!(bob.unpack_message(&packed).is_ok());
    assert!(matches!(
        eve.unpack_detailed(&packed).unwrap_err(),
        didcomm_peer::AgentError::Unpack(UnpackError::DecryptionFailed)
    ));
    // Not even the sender.
    assert!(alice.unpack_message(&packed).is_err());
}

#[test]
fn any_tampered_field_kills_the_envelope() {
    let (alice, alice_did) = party();
    let (bob, bob_did) = party();

    let packed = alice
        .pack_message("fragile", &bob_did, Some(&alice_did), &PackOptions::default())
        .unwrap();
    let envelope = Envelope::from_json(&packed).unwrap();

    let flip = |s: &str| -> String {
        // Swap the first character for a different base64url character.
        let mut chars: Vec<char> = s.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    };

    for field in ["ciphertext", "tag", "encrypted_key"] {
        let mut tampered = envelope.clone();
        match field {
            "ciphertext" => tampered.ciphertext = flip(&tampered.ciphertext),
            "tag" => tampered.tag = flip(&tampered.tag),
            _ => tampered.recipients[0].encrypted_key = flip(&tampered.recipients[0].encrypted_key),
        }
        let result = bob.unpack_message(&tampered.to_json().unwrap());
        assert!(result.is_err(), "tampered {field} must not unpack");
    }
}

#[test]
fn garbage_and_empty_inputs_are_rejected_structurally() {
    let (bob, _) = party();
    for bad in ["", "{}", "null", "[]", "definitely not json"] {
        assert!(matches!(
            bob.unpack_detailed(bad).unwrap_err(),
            didcomm_peer::AgentError::Unpack(UnpackError::Malformed(_))
        ));
    }
}

#[test]
fn malformed_dids_fail_resolution_not_panic() {
    let agent = Agent::new();
    for bad in [
        "did:peer:9zUnknownAlgo",
        "did:peer:2",
        "did:peer:2.Xz6Mk",
        "did:web:example.com",
        "not a did at all",
    ] {
        assert!(agent.resolve_identity(bad, KeyFormat::Jwk).is_err());
    }
}

// ---------------------------------------------------------------------------
// Multi-key recipients
// ---------------------------------------------------------------------------

#[test]
fn envelope_opens_with_whichever_key_the_recipient_holds() {
    let multi = Agent::new();
    let multi_did = multi.create_identity(1, 3, None, Vec::new()).unwrap();

    let sender = Agent::new();
    let packed = sender
        .pack_message("any of three", &multi_did, None, &PackOptions::default())
        .unwrap();

    // A device holding only the third agreement key still reads it.
    let device = Agent::new();
    let third = format!("{multi_did}#key-3");
    device.secrets().put(multi.secrets().get(&third).unwrap());
    let detail = device.unpack_detailed(&packed).unwrap();
    assert_eq!(detail.message.text(), Some("any of three"));
    assert_eq!(detail.metadata.encrypted_to, third);
    assert_eq!(detail.recipient, multi_did);

    // The envelope carried one wrapped key per advertised agreement key.
    let envelope = Envelope::from_json(&packed).unwrap();
    assert_eq!(envelope.recipients.len(), 3);
}
