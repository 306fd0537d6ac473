// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Cryptographic Primitives
//!
//! Everything security-critical in the crate flows through this module:
//! key generation, Diffie-Hellman, key derivation, and authenticated
//! encryption.
//!
//! The choices are deliberately boring and well-audited:
//!
//! - **Ed25519** for signatures — deterministic, fast, RFC 8032.
//! - **X25519** for key agreement — same curve in Montgomery clothing.
//! - **AES-256-GCM** for symmetric AEAD — one cipher for payloads and
//!   key wrapping alike.
//! - **BLAKE3** (`derive_key` mode) for turning DH outputs into AES keys.
//!
//! Nothing here is novel cryptography; it is thin, type-safe plumbing
//! around `ed25519-dalek`, `x25519-dalek`, `aes-gcm`, and `blake3`. If
//! you feel an urge to optimize any of it, go read about timing attacks
//! first and see if the urge survives.

pub mod encryption;
pub mod kdf;
pub mod keys;

pub use encryption::{open, open_detached, random_key, seal, seal_detached, EncryptionError};
pub use kdf::{anoncrypt_kek, authcrypt_kek};
pub use keys::{
    validate_verifying_key, verify_signature, AgreementKeypair, KeyError, KeyRole, Keypair,
    SigningKeypair,
};
