// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # didcomm-peer — DID-Keyed Encrypted Messaging
//!
//! End-to-end encrypted messaging where the address *is* the key
//! material: every party is named by a peer DID, a self-certifying
//! identifier derived purely from its public keys, and every envelope is
//! encrypted to whatever keys that identifier encodes. No registries, no
//! ledgers, no certificate authorities — if you can parse the DID, you
//! can encrypt to it.
//!
//! Curve choices are the boring, correct ones: Ed25519 for signatures,
//! X25519 for key agreement, AES-256-GCM for content encryption, and
//! BLAKE3 as the key derivation function.
//!
//! ## Architecture
//!
//! The crate is layered bottom-up, each module depending only on the
//! ones above it in this list:
//!
//! - **config** — Every constant and magic string, in one place.
//! - **crypto** — Keypairs, AEAD, and KEK derivation. Don't roll your own.
//! - **peer** — Peer DID derivation, parsing, and document resolution.
//! - **secrets** — Pluggable private key storage, keyed by kid.
//! - **envelope** — Pack and unpack: anoncrypt, authcrypt, sign-then-encrypt.
//! - **agent** — The friendly top layer: identities in, envelopes out.
//!
//! ## Design Philosophy
//!
//! 1. Fail closed. A tampered envelope yields an error, never partial
//!    plaintext.
//! 2. Decryption errors are deliberately vague — precise failure reasons
//!    are an oracle.
//! 3. Private key bytes never appear in `Debug` output or logs.
//! 4. Derivation and resolution are exact inverses, and tested as such.

pub mod agent;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod peer;
pub mod secrets;

pub use agent::{Agent, AgentError};
pub use envelope::{pack_encrypted, unpack, Message, PackOptions, UnpackResult};
pub use peer::did::PeerDid;
pub use peer::document::{resolve, DidDocument, KeyFormat};
pub use secrets::{InMemorySecretStore, Secret, SecretStore};
