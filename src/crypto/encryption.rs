// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # AES-256-GCM Primitives
//!
//! The single AEAD used everywhere in this crate: payload encryption,
//! content-key wrapping, nothing else. AES-256-GCM because it's boring,
//! audited, and hardware-accelerated on anything built this decade.
//!
//! ## Nonce discipline
//!
//! GCM does not forgive nonce reuse — two messages under the same key and
//! nonce leak the XOR of the plaintexts and let an attacker forge tags.
//! Every seal operation here draws a fresh random 96-bit nonce from
//! `OsRng`. Keys are single-purpose (a KEK wraps exactly one CEK, a CEK
//! encrypts exactly one payload), so the birthday bound is never even in
//! the same postcode.
//!
//! ## Two wire shapes
//!
//! - [`seal`]/[`open`] pack `nonce || ciphertext+tag` into one buffer.
//!   Used for wrapped content keys, where a single opaque blob is all the
//!   envelope format needs.
//! - [`seal_detached`]/[`open_detached`] return nonce, ciphertext, and
//!   tag as separate pieces, because the envelope carries `iv`,
//!   `ciphertext`, and `tag` as distinct fields.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH};

/// Errors from sealing and opening.
///
/// Deliberately uninformative. "Wrong key", "flipped bit", and "truncated
/// input" all fail identically — distinguishing them helps nobody we want
/// to help.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("sealed data too short")]
    InputTooShort,
}

/// A detached-seal result: the three pieces the envelope format carries
/// as separate base64url fields.
pub struct Detached {
    /// The random 96-bit nonce.
    pub nonce: [u8; AES_NONCE_LENGTH],
    /// Ciphertext without the tag.
    pub ciphertext: Vec<u8>,
    /// The 128-bit GCM authentication tag.
    pub tag: [u8; AES_TAG_LENGTH],
}

/// Encrypt with a random nonce, returning `nonce || ciphertext+tag`.
pub fn seal(key: &[u8; AES_KEY_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a `nonce || ciphertext+tag` buffer produced by [`seal`].
pub fn open(key: &[u8; AES_KEY_LENGTH], sealed: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::InputTooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed)
}

/// Encrypt with additional authenticated data, returning the nonce,
/// ciphertext, and tag as separate pieces.
///
/// The AAD is authenticated but not encrypted; the caller must present
/// byte-identical AAD at open time or authentication fails. The envelope
/// engine feeds the serialized protected header through here so that any
/// header tampering kills the whole envelope.
pub fn seal_detached(
    key: &[u8; AES_KEY_LENGTH],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Detached, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut combined = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| EncryptionError::EncryptFailed)?;

    // aes-gcm appends the tag; the wire format wants it separate.
    let split = combined.len() - AES_TAG_LENGTH;
    let tag_bytes = combined.split_off(split);
    let mut tag = [0u8; AES_TAG_LENGTH];
    tag.copy_from_slice(&tag_bytes);

    Ok(Detached {
        nonce: nonce_bytes,
        ciphertext: combined,
        tag,
    })
}

/// Decrypt a detached `(nonce, ciphertext, tag)` triple with AAD.
pub fn open_detached(
    key: &[u8; AES_KEY_LENGTH],
    nonce: &[u8; AES_NONCE_LENGTH],
    ciphertext: &[u8],
    tag: &[u8; AES_TAG_LENGTH],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    let mut combined = Vec::with_capacity(ciphertext.len() + AES_TAG_LENGTH);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: &combined,
                aad,
            },
        )
        .map_err(|_| EncryptionError::DecryptFailed)
}

/// Draw a fresh random 256-bit content encryption key.
pub fn random_key() -> [u8; AES_KEY_LENGTH] {
    let mut key = [0u8; AES_KEY_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}
