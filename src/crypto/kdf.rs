// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Key Encryption Key Derivation
//!
//! Turns raw X25519 Diffie-Hellman outputs into the per-recipient AES
//! keys that wrap an envelope's content encryption key.
//!
//! Raw DH output is a curve point coordinate — it has algebraic structure
//! and is not uniformly random over `{0,1}^256`. Feeding it straight into
//! AES-GCM would be a textbook mistake, so everything goes through
//! BLAKE3's `derive_key` mode: a purpose-built KDF with domain separation
//! baked into the context string.
//!
//! Two constructions, one per envelope family:
//!
//! - **Anonymous (ECDH-ES style)** — one DH between a throwaway ephemeral
//!   key and the recipient's static agreement key. Anyone can produce
//!   this; the recipient learns nothing about who did.
//! - **Authenticated (ECDH-1PU style)** — two DH outputs combined: the
//!   ephemeral-static one above, plus a static-static DH between sender
//!   and recipient. Only someone holding the sender's agreement secret
//!   can derive the KEK, which is what binds the sender's identity into
//!   the ciphertext itself.
//!
//! Both constructions fold the relevant public keys into the KDF input,
//! binding the derived key to this exact pairing of parties. A transcript
//! replayed against a different recipient derives a different key and
//! the unwrap simply fails.

use crate::config::{AES_KEY_LENGTH, KDF_CONTEXT_ANON, KDF_CONTEXT_AUTH};

/// Derive the KEK for one recipient of an anonymous envelope.
///
/// `ze` is the ephemeral-static DH output; the ephemeral and recipient
/// public keys pin the derivation to this sender instance and recipient.
/// Both sides can compute every input: the packer holds the ephemeral
/// secret, the recipient reads `epk` from the protected header.
pub fn anoncrypt_kek(
    ze: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> [u8; AES_KEY_LENGTH] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_ANON);
    hasher.update(ze);
    hasher.update(ephemeral_public);
    hasher.update(recipient_public);
    finalize(hasher)
}

/// Derive the KEK for one recipient of an authenticated envelope.
///
/// `ze` is the ephemeral-static DH, `zs` the sender-static to
/// recipient-static DH. The inputs deliberately stay in fixed protocol
/// order (ephemeral, sender, recipient) rather than the sorted canonical
/// order a symmetric session KDF would use: pack and unpack sides play
/// different roles but feed identical transcripts.
pub fn authcrypt_kek(
    ze: &[u8; 32],
    zs: &[u8; 32],
    ephemeral_public: &[u8; 32],
    sender_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> [u8; AES_KEY_LENGTH] {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_AUTH);
    hasher.update(ze);
    hasher.update(zs);
    hasher.update(ephemeral_public);
    hasher.update(sender_public);
    hasher.update(recipient_public);
    finalize(hasher)
}

fn finalize(hasher: blake3::Hasher) -> [u8; AES_KEY_LENGTH] {
    let mut kek = [0u8; AES_KEY_LENGTH];
    hasher.finalize_xof().fill(&mut kek);
    kek
}
