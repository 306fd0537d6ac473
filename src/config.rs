// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Protocol Constants
//!
//! Every magic number and identifier string in the crate lives here. If a
//! constant is hardcoded anywhere else, that's a bug report waiting to
//! happen.
//!
//! Most of these values are dictated by the algorithms we build on
//! (Ed25519, X25519, AES-256-GCM) or by the peer DID encoding rules, so
//! there is very little room for tuning. The ones that are genuine policy
//! choices (KDF context strings, nesting depth) are documented as such.

// ---------------------------------------------------------------------------
// Key Material
// ---------------------------------------------------------------------------

/// Ed25519 secret key (seed) length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// X25519 secret and public key length in bytes. Montgomery-form
/// Curve25519 — same curve as Ed25519, different coordinates.
pub const AGREEMENT_KEY_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Symmetric Encryption (AES-256-GCM)
// ---------------------------------------------------------------------------

/// AES-256-GCM key length in bytes. Also the content encryption key (CEK)
/// and key encryption key (KEK) length — everything symmetric in this
/// crate is 256 bits.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes. 96 bits is the standard GCM nonce
/// size and the only one we use.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Multicodec Prefixes
// ---------------------------------------------------------------------------
//
// Peer DIDs embed public keys as multibase(base58btc) over a multicodec-
// prefixed byte string. The two-byte prefixes below are the varint
// encodings of the registered multicodec codes for each key type.

/// Multicodec prefix for Ed25519 public keys (0xed as a varint).
pub const MULTICODEC_ED25519: [u8; 2] = [0xed, 0x01];

/// Multicodec prefix for X25519 public keys (0xec as a varint).
pub const MULTICODEC_X25519: [u8; 2] = [0xec, 0x01];

/// Multibase prefix character for base58btc.
pub const MULTIBASE_BASE58BTC: char = 'z';

// ---------------------------------------------------------------------------
// Peer DID Method
// ---------------------------------------------------------------------------

/// The DID method prefix shared by both numalgos.
pub const PEER_DID_PREFIX: &str = "did:peer:";

/// Full prefix of a numalgo0 peer DID (single inline authentication key).
pub const NUMALGO_0_PREFIX: &str = "did:peer:0";

/// Full prefix of a numalgo2 peer DID (multi-key, optional service).
pub const NUMALGO_2_PREFIX: &str = "did:peer:2";

/// numalgo2 element tag for an agreement (encryption) key.
pub const ELEMENT_AGREEMENT: char = 'E';

/// numalgo2 element tag for an authentication (signing) key.
pub const ELEMENT_AUTHENTICATION: char = 'V';

/// numalgo2 element tag for an encoded service block.
pub const ELEMENT_SERVICE: char = 'S';

/// Service type advertised by messaging-capable identities.
pub const SERVICE_TYPE_DIDCOMM_MESSAGING: &str = "DIDCommMessaging";

/// Protocol versions a DIDComm messaging service accepts.
pub const SERVICE_ACCEPT_DIDCOMM_V2: &str = "didcomm/v2";

// ---------------------------------------------------------------------------
// Envelope Wire Format
// ---------------------------------------------------------------------------

/// Media type carried in the protected header of every envelope.
pub const ENVELOPE_TYP: &str = "application/didcomm-encrypted+json";

/// Header `alg` value for anonymous encryption: ephemeral-static ECDH,
/// AES key wrap. The sender contributes no long-term key material.
pub const ALG_ANONCRYPT: &str = "ECDH-ES+A256KW";

/// Header `alg` value for authenticated encryption: one-pass unified
/// ECDH folding the sender's static agreement key into the KEK.
pub const ALG_AUTHCRYPT: &str = "ECDH-1PU+A256KW";

/// Header `enc` value — the payload AEAD.
pub const ENC_A256GCM: &str = "A256GCM";

/// Signature algorithm identifier for detached message signatures.
pub const ALG_EDDSA: &str = "EdDSA";

/// Default message type stamped on plaintext messages built by the agent.
pub const MESSAGE_TYPE_BASIC: &str = "https://didcomm.org/basicmessage/2.0/message";

/// How many nested envelopes unpack will unwrap before declaring the
/// input malformed. Sender hiding produces exactly one level of nesting;
/// anything deeper than this is hostile or broken input.
pub const MAX_ENVELOPE_DEPTH: usize = 3;

// ---------------------------------------------------------------------------
// KDF Context Strings
// ---------------------------------------------------------------------------
//
// BLAKE3 derive_key contexts. These are domain separators: two KDF calls
// with different contexts can never produce colliding keys, even from
// identical input. Changing either string is a wire-format break.

/// KEK derivation context for anonymous (ECDH-ES style) envelopes.
pub const KDF_CONTEXT_ANON: &str = "didcomm-peer v1 anon kek";

/// KEK derivation context for authenticated (ECDH-1PU style) envelopes.
pub const KDF_CONTEXT_AUTH: &str = "didcomm-peer v1 auth kek";
