// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Envelope Unpacking
//!
//! The inverse of packing: peel encryption layers with keys from the
//! secret store, verify whatever authentication each layer carries, and
//! hand back the plaintext message together with metadata describing
//! what protections it actually arrived under.
//!
//! ## Trust boundary
//!
//! The input string is attacker-controlled. Everything about it is
//! verified before any plaintext escapes: structural parsing is strict,
//! AEAD tags cover both payload and header, and a signature that fails
//! to verify aborts the whole operation. There is no partial success —
//! a tampered envelope yields an error and nothing else.
//!
//! Failures deliberately collapse into coarse categories. A wrong KEK, a
//! flipped ciphertext bit, and an absent recipient key all surface as
//! [`UnpackError::DecryptionFailed`]; distinguishing them would hand an
//! attacker an oracle.

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ALG_EDDSA, ENC_A256GCM, ENVELOPE_TYP, MAX_ENVELOPE_DEPTH};
use crate::crypto::encryption::{open, open_detached};
use crate::crypto::kdf::{anoncrypt_kek, authcrypt_kek};
use crate::crypto::keys::{verify_signature, KeyRole};
use crate::envelope::wire::{Envelope, EnvelopeAlg, Message, SignedPayload, WireError};
use crate::peer::document::resolve_key_by_kid;
use crate::secrets::SecretStore;

/// Errors from envelope opening.
#[derive(Debug, Error)]
pub enum UnpackError {
    /// The input is not a structurally valid envelope, or a nested
    /// layer is inconsistent with its framing.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// No stored key opens this envelope, or decryption failed outright.
    /// Deliberately does not say which.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The payload carries a signature that does not verify, names an
    /// unresolvable signer, or uses an unknown signature algorithm.
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

impl From<WireError> for UnpackError {
    fn from(e: WireError) -> Self {
        UnpackError::Malformed(e.to_string())
    }
}

/// What an envelope turned out to contain, beyond the message itself.
///
/// Callers decide trust from these flags, not from the message body: a
/// `from` field inside the message is a routing hint, while
/// `authenticated` reports what the cryptography actually proved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackMetadata {
    /// Sender authentication was cryptographically verified (authcrypt).
    pub authenticated: bool,
    /// The outermost layer exposed no sender identity.
    pub anonymous_sender: bool,
    /// The payload carried a verified signature.
    pub signed: bool,
    /// Key identifier that authenticated the encryption, if any.
    pub encrypted_from: Option<String>,
    /// Our key identifier that opened the innermost layer.
    pub encrypted_to: String,
    /// Key identifier whose signature verified, if any.
    pub sign_from: Option<String>,
    /// Key-wrapping algorithm of the innermost layer.
    pub alg: String,
    /// Content encryption algorithm.
    pub enc: String,
}

/// A successfully opened envelope.
#[derive(Debug, Clone)]
pub struct UnpackResult {
    pub message: Message,
    /// Sender DID, when the envelope was authenticated.
    pub sender: Option<String>,
    /// Recipient DID whose key opened the envelope.
    pub recipient: String,
    pub metadata: UnpackMetadata,
}

/// One decrypted layer, before we know whether its plaintext is a
/// message or another envelope.
struct OpenedLayer {
    plaintext: Vec<u8>,
    alg: EnvelopeAlg,
    skid: Option<String>,
    matched_kid: String,
    nested: bool,
}

/// Decrypt `packed` with keys from `secrets`, verifying sender
/// authentication and signatures along the way.
pub fn unpack(secrets: &dyn SecretStore, packed: &str) -> Result<UnpackResult, UnpackError> {
    let mut current = packed.to_string();
    let mut layer = open_layer(secrets, &current)?;

    // Outermost layer decides what the network saw.
    let anonymous_outer = layer.alg == EnvelopeAlg::Anoncrypt;

    for _ in 1..MAX_ENVELOPE_DEPTH {
        if !layer.nested {
            break;
        }
        current = String::from_utf8(layer.plaintext)
            .map_err(|_| UnpackError::Malformed("nested envelope is not UTF-8".into()))?;
        layer = open_layer(secrets, &current)?;
    }
    if layer.nested {
        return Err(UnpackError::Malformed(format!(
            "envelope nesting exceeds depth {MAX_ENVELOPE_DEPTH}"
        )));
    }

    let authenticated = layer.alg == EnvelopeAlg::Authcrypt;
    let encrypted_from = layer.skid.clone();
    let sender = encrypted_from
        .as_deref()
        .and_then(|kid| kid.split_once('#'))
        .map(|(did, _)| did.to_string());
    let recipient = layer
        .matched_kid
        .split_once('#')
        .map(|(did, _)| did.to_string())
        .ok_or_else(|| UnpackError::Malformed("recipient kid has no fragment".into()))?;

    let (message, sign_from) = parse_payload(&layer.plaintext)?;

    // A message claiming a sender the encryption didn't prove is fine
    // (unauthenticated hint); a proven sender contradicting the message
    // body is not.
    if authenticated {
        if let (Some(claimed), Some(proved)) = (&message.from, &sender) {
            if claimed != proved {
                return Err(UnpackError::Malformed(
                    "message 'from' contradicts authenticated sender".into(),
                ));
            }
        }
    }

    debug!(
        authenticated,
        signed = sign_from.is_some(),
        recipient = %recipient,
        "unpacked envelope"
    );

    Ok(UnpackResult {
        message,
        sender,
        recipient: recipient.clone(),
        metadata: UnpackMetadata {
            authenticated,
            anonymous_sender: anonymous_outer,
            signed: sign_from.is_some(),
            encrypted_from,
            encrypted_to: layer.matched_kid,
            sign_from,
            alg: layer.alg.as_str().to_string(),
            enc: ENC_A256GCM.to_string(),
        },
    })
}

/// Open a single envelope layer: find our recipient entry, derive the
/// KEK, unwrap the CEK, decrypt the payload.
fn open_layer(secrets: &dyn SecretStore, json: &str) -> Result<OpenedLayer, UnpackError> {
    let envelope = Envelope::from_json(json)?;
    let header = envelope.header()?;
    let alg = EnvelopeAlg::parse(&header.alg)?;
    let ephemeral_public = header.epk.to_bytes()?;

    // Authcrypt needs the sender's static public key before any DH.
    let sender_static = match alg {
        EnvelopeAlg::Anoncrypt => {
            if header.skid.is_some() {
                return Err(UnpackError::Malformed("anoncrypt envelope carries skid".into()));
            }
            None
        }
        EnvelopeAlg::Authcrypt => {
            let skid = header
                .skid
                .as_deref()
                .ok_or_else(|| UnpackError::Malformed("authcrypt envelope without skid".into()))?;
            let public = resolve_key_by_kid(skid, KeyRole::Agreement)
                .map_err(|e| UnpackError::Malformed(format!("sender kid: {e}")))?;
            Some(public)
        }
    };

    // First recipient entry we hold a key for wins; header order is the
    // tie-break.
    for recipient in &envelope.recipients {
        let kid = &recipient.header.kid;
        let Some(secret) = secrets.get(kid) else {
            continue;
        };
        let Some(keypair) = secret.agreement_keypair() else {
            continue;
        };
        trace!(kid = %kid, "attempting recipient key");

        let recipient_public = keypair.public_bytes();
        let ze = keypair.diffie_hellman(&ephemeral_public);
        let kek = match sender_static {
            None => anoncrypt_kek(&ze, &ephemeral_public, &recipient_public),
            Some(sender_public) => {
                let zs = keypair.diffie_hellman(&sender_public);
                authcrypt_kek(
                    &ze,
                    &zs,
                    &ephemeral_public,
                    &sender_public,
                    &recipient_public,
                )
            }
        };

        let wrapped = crate::peer::encoding::b64url_decode(&recipient.encrypted_key)
            .map_err(|_| UnpackError::Malformed("encrypted_key encoding".into()))?;
        let cek_bytes = open(&kek, &wrapped).map_err(|_| UnpackError::DecryptionFailed)?;
        let cek: [u8; 32] = cek_bytes
            .as_slice()
            .try_into()
            .map_err(|_| UnpackError::DecryptionFailed)?;

        let plaintext = open_detached(
            &cek,
            &envelope.nonce()?,
            &envelope.ciphertext_bytes()?,
            &envelope.tag_bytes()?,
            envelope.protected.as_bytes(),
        )
        .map_err(|_| UnpackError::DecryptionFailed)?;

        let nested = header.cty.as_deref() == Some(ENVELOPE_TYP);
        return Ok(OpenedLayer {
            plaintext,
            alg,
            skid: header.skid.clone(),
            matched_kid: kid.clone(),
            nested,
        });
    }

    // No stored key matched any recipient entry.
    Err(UnpackError::DecryptionFailed)
}

/// Decode the decrypted payload: either a bare message or a signed
/// wrapper around one. Returns the message and the verified signer kid.
fn parse_payload(plaintext: &[u8]) -> Result<(Message, Option<String>), UnpackError> {
    let value: serde_json::Value = serde_json::from_slice(plaintext)
        .map_err(|_| UnpackError::Malformed("payload is not JSON".into()))?;

    if value.get("signatures").is_none() {
        let message: Message = serde_json::from_value(value)
            .map_err(|_| UnpackError::Malformed("payload is not a message".into()))?;
        return Ok((message, None));
    }

    let signed: SignedPayload = serde_json::from_value(value)
        .map_err(|_| UnpackError::Malformed("malformed signed payload".into()))?;
    let payload_bytes = signed.payload_bytes()?;

    let signature = signed
        .signatures
        .first()
        .ok_or_else(|| UnpackError::Malformed("signed payload without signatures".into()))?;
    let header = signature.header()?;
    if header.alg != ALG_EDDSA {
        return Err(UnpackError::SignatureVerificationFailed);
    }
    let signer_public = resolve_key_by_kid(&header.kid, KeyRole::Authentication)
        .map_err(|_| UnpackError::SignatureVerificationFailed)?;
    let signature_bytes = crate::peer::encoding::b64url_decode(&signature.signature)
        .map_err(|_| UnpackError::Malformed("signature encoding".into()))?;
    if !verify_signature(&signer_public, &payload_bytes, &signature_bytes) {
        return Err(UnpackError::SignatureVerificationFailed);
    }

    let message: Message = serde_json::from_slice(&payload_bytes)
        .map_err(|_| UnpackError::Malformed("signed payload is not a message".into()))?;
    Ok((message, Some(header.kid)))
}
