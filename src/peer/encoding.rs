// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Key and Service Block Encodings
//!
//! The two binary-to-text encodings a peer DID is assembled from:
//!
//! - Public keys travel as **multibase(base58btc, multicodec || key)** —
//!   a `z` prefix marking base58btc, then the two-byte multicodec tag
//!   identifying the key type, then the raw 32 key bytes.
//! - Service blocks travel as **base64url (no padding)** over a minified
//!   JSON object.
//!
//! Both encodings are strict on decode: wrong multibase prefix, unknown
//! multicodec, wrong key length, or non-canonical base64url all fail
//! loudly. A self-certifying identifier that tolerates sloppy encodings
//! isn't certifying much.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::config::{MULTIBASE_BASE58BTC, MULTICODEC_ED25519, MULTICODEC_X25519};
use crate::crypto::keys::KeyRole;

/// Errors from decoding multibase keys or base64url blocks.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("missing or unsupported multibase prefix (expected 'z' base58btc)")]
    BadMultibasePrefix,

    #[error("invalid base58 encoding")]
    BadBase58,

    #[error("unknown multicodec prefix")]
    UnknownMulticodec,

    #[error("invalid key length: expected 32 bytes after multicodec prefix")]
    BadKeyLength,

    #[error("invalid base64url encoding")]
    BadBase64,
}

/// Encode a raw 32-byte public key as a multibase string for the given role.
///
/// Authentication keys get the Ed25519 multicodec tag, agreement keys the
/// X25519 tag. The result starts with `z` (base58btc).
pub fn encode_multibase_key(role: KeyRole, raw: &[u8; 32]) -> String {
    let codec = match role {
        KeyRole::Authentication => MULTICODEC_ED25519,
        KeyRole::Agreement => MULTICODEC_X25519,
    };
    let mut prefixed = Vec::with_capacity(2 + raw.len());
    prefixed.extend_from_slice(&codec);
    prefixed.extend_from_slice(raw);
    format!("{}{}", MULTIBASE_BASE58BTC, bs58::encode(prefixed).into_string())
}

/// Decode a multibase key string back into its role and raw 32 bytes.
///
/// The role comes from the multicodec tag, so a key encoded for one role
/// can never be smuggled into the other's list.
pub fn decode_multibase_key(encoded: &str) -> Result<(KeyRole, [u8; 32]), EncodingError> {
    let rest = encoded
        .strip_prefix(MULTIBASE_BASE58BTC)
        .ok_or(EncodingError::BadMultibasePrefix)?;

    let bytes = bs58::decode(rest)
        .into_vec()
        .map_err(|_| EncodingError::BadBase58)?;
    if bytes.len() < 2 {
        return Err(EncodingError::UnknownMulticodec);
    }

    let (codec, raw) = bytes.split_at(2);
    let role = if codec == MULTICODEC_ED25519 {
        KeyRole::Authentication
    } else if codec == MULTICODEC_X25519 {
        KeyRole::Agreement
    } else {
        return Err(EncodingError::UnknownMulticodec);
    };

    let raw: [u8; 32] = raw.try_into().map_err(|_| EncodingError::BadKeyLength)?;
    Ok((role, raw))
}

/// Encode bytes as unpadded base64url.
pub fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode unpadded base64url.
pub fn b64url_decode(encoded: &str) -> Result<Vec<u8>, EncodingError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| EncodingError::BadBase64)
}
