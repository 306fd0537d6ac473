// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Envelope Wire Structures
//!
//! The serialized shapes that cross a wire: the plaintext message, the
//! JWS-like signed wrapper, and the JWE-like encrypted envelope. All of
//! them are compact JSON with base64url-encoded binary fields.
//!
//! Parsing is strict: unknown algorithm strings, undecodable base64,
//! wrong-length nonces or tags, and missing fields all surface as
//! structural errors before any cryptography runs. An envelope either
//! parses completely or is rejected — there is no lenient mode.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{
    AES_NONCE_LENGTH, AES_TAG_LENGTH, ALG_ANONCRYPT, ALG_AUTHCRYPT, ENC_A256GCM, ENVELOPE_TYP,
    MESSAGE_TYPE_BASIC,
};
use crate::peer::encoding::{b64url_decode, b64url_encode};

/// Structural wire-format failures.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

// ---------------------------------------------------------------------------
// Plaintext message
// ---------------------------------------------------------------------------

/// The plaintext unit of communication, before any encryption.
///
/// Mirrors the DIDComm message shape: an id, a type URI, a JSON body,
/// and optional sender/recipient routing hints. The body is free-form
/// JSON; the agent layer conventionally uses `{"msg": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub body: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
}

impl Message {
    /// A basic text message with a fresh random id.
    pub fn basic(text: &str, to: &str, from: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            type_: MESSAGE_TYPE_BASIC.to_string(),
            body: serde_json::json!({ "msg": text }),
            from: from.map(str::to_string),
            to: vec![to.to_string()],
        }
    }

    /// The `msg` text out of a basic message body, if present.
    pub fn text(&self) -> Option<&str> {
        self.body.get("msg").and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Signed wrapper (JWS-like)
// ---------------------------------------------------------------------------

/// Protected header of a detached signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Always `EdDSA`.
    pub alg: String,
    /// The signer's key identifier; its DID resolves to the public key.
    pub kid: String,
}

/// One signature over the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// base64url-encoded [`SignatureHeader`] JSON.
    pub protected: String,
    /// base64url-encoded 64-byte Ed25519 signature over the decoded payload.
    pub signature: String,
}

impl Signature {
    pub fn header(&self) -> Result<SignatureHeader, WireError> {
        let bytes = b64url_decode(&self.protected)
            .map_err(|_| WireError::Malformed("signature protected header".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| WireError::Malformed("signature protected header JSON".into()))
    }
}

/// A signed-but-not-yet-encrypted payload. Travels only inside
/// ciphertext (sign-then-encrypt); it never appears on the wire bare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// base64url-encoded message JSON.
    pub payload: String,
    pub signatures: Vec<Signature>,
}

impl SignedPayload {
    pub fn payload_bytes(&self) -> Result<Vec<u8>, WireError> {
        b64url_decode(&self.payload).map_err(|_| WireError::Malformed("signed payload".into()))
    }
}

// ---------------------------------------------------------------------------
// Encrypted envelope (JWE-like)
// ---------------------------------------------------------------------------

/// The envelope families the engine produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeAlg {
    /// ECDH-ES style: no sender authentication.
    Anoncrypt,
    /// ECDH-1PU style: sender's static key folded into the KEK.
    Authcrypt,
}

impl EnvelopeAlg {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeAlg::Anoncrypt => ALG_ANONCRYPT,
            EnvelopeAlg::Authcrypt => ALG_AUTHCRYPT,
        }
    }

    pub fn parse(s: &str) -> Result<Self, WireError> {
        match s {
            ALG_ANONCRYPT => Ok(EnvelopeAlg::Anoncrypt),
            ALG_AUTHCRYPT => Ok(EnvelopeAlg::Authcrypt),
            other => Err(WireError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// The ephemeral X25519 public key carried in the protected header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralKey {
    pub kty: String,
    pub crv: String,
    /// base64url-encoded raw 32 bytes.
    pub x: String,
}

impl EphemeralKey {
    pub fn from_bytes(public: &[u8; 32]) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: "X25519".to_string(),
            x: b64url_encode(public),
        }
    }

    pub fn to_bytes(&self) -> Result<[u8; 32], WireError> {
        if self.kty != "OKP" || self.crv != "X25519" {
            return Err(WireError::Malformed(format!(
                "unexpected epk type {}/{}",
                self.kty, self.crv
            )));
        }
        let bytes =
            b64url_decode(&self.x).map_err(|_| WireError::Malformed("epk encoding".into()))?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| WireError::Malformed("epk must be 32 bytes".into()))
    }
}

/// The cleartext-visible (but integrity-protected) header of an envelope.
///
/// Serialized to JSON, base64url-encoded into [`Envelope::protected`],
/// and fed to the payload AEAD as additional authenticated data — so any
/// bit flipped here kills the whole envelope at tag verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    pub typ: String,
    pub alg: String,
    pub enc: String,
    pub epk: EphemeralKey,
    /// Sender key identifier. Present only on authcrypt envelopes that do
    /// NOT hide the sender; a hidden sender's skid lives one encryption
    /// layer down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skid: Option<String>,
    /// Content type of the plaintext, set when the payload is itself a
    /// nested envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cty: Option<String>,
}

impl ProtectedHeader {
    pub fn new(alg: EnvelopeAlg, epk: EphemeralKey) -> Self {
        Self {
            typ: ENVELOPE_TYP.to_string(),
            alg: alg.as_str().to_string(),
            enc: ENC_A256GCM.to_string(),
            epk,
            skid: None,
            cty: None,
        }
    }

    /// Serialize and base64url-encode. The exact returned string is what
    /// gets AAD-bound, so it is computed once at pack time and never
    /// re-serialized.
    pub fn encode(&self) -> Result<String, WireError> {
        let json = serde_json::to_vec(self)
            .map_err(|e| WireError::Malformed(format!("header serialization: {e}")))?;
        Ok(b64url_encode(&json))
    }

    pub fn decode(encoded: &str) -> Result<Self, WireError> {
        let bytes = b64url_decode(encoded)
            .map_err(|_| WireError::Malformed("protected header encoding".into()))?;
        let header: Self = serde_json::from_slice(&bytes)
            .map_err(|_| WireError::Malformed("protected header JSON".into()))?;
        if header.enc != ENC_A256GCM {
            return Err(WireError::UnsupportedAlgorithm(header.enc));
        }
        Ok(header)
    }
}

/// One recipient entry: who it's for and their wrapped copy of the CEK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub header: RecipientHeader,
    /// base64url of `nonce || AES-GCM(KEK, CEK)`.
    pub encrypted_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientHeader {
    /// The recipient agreement key this copy was wrapped for.
    pub kid: String,
}

/// The encrypted envelope as it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// base64url-encoded [`ProtectedHeader`] JSON. Kept encoded because
    /// the bytes double as the AEAD's additional authenticated data.
    pub protected: String,
    /// Per-recipient wrapped content keys, in pack order. Unpack scans
    /// this list in order — the order is observable behavior.
    pub recipients: Vec<Recipient>,
    /// base64url 96-bit payload nonce.
    pub iv: String,
    /// base64url payload ciphertext (tag excluded).
    pub ciphertext: String,
    /// base64url 128-bit GCM tag.
    pub tag: String,
}

impl Envelope {
    /// Parse an envelope from its JSON wire form, validating structure
    /// and field lengths but performing no cryptography.
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        let envelope: Self = serde_json::from_str(json)
            .map_err(|_| WireError::Malformed("not an envelope JSON object".into()))?;
        if envelope.recipients.is_empty() {
            return Err(WireError::Malformed("no recipients".into()));
        }
        // Force early validation of the binary fields.
        envelope.nonce()?;
        envelope.tag_bytes()?;
        envelope.ciphertext_bytes()?;
        Ok(envelope)
    }

    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self)
            .map_err(|e| WireError::Malformed(format!("envelope serialization: {e}")))
    }

    pub fn header(&self) -> Result<ProtectedHeader, WireError> {
        ProtectedHeader::decode(&self.protected)
    }

    pub fn nonce(&self) -> Result<[u8; AES_NONCE_LENGTH], WireError> {
        let bytes =
            b64url_decode(&self.iv).map_err(|_| WireError::Malformed("iv encoding".into()))?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| WireError::Malformed("iv must be 12 bytes".into()))
    }

    pub fn tag_bytes(&self) -> Result<[u8; AES_TAG_LENGTH], WireError> {
        let bytes =
            b64url_decode(&self.tag).map_err(|_| WireError::Malformed("tag encoding".into()))?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| WireError::Malformed("tag must be 16 bytes".into()))
    }

    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, WireError> {
        b64url_decode(&self.ciphertext)
            .map_err(|_| WireError::Malformed("ciphertext encoding".into()))
    }
}
