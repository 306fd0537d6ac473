// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # DID Document Resolution
//!
//! Synthesizes a W3C-shaped DID document from a peer DID string — the
//! exact inverse of derivation. Nothing is looked up anywhere: every
//! verification method is decoded straight out of the identifier, which
//! is the whole trick of self-certifying DIDs.
//!
//! ## Key identifiers
//!
//! Verification methods are numbered `<did>#key-1`, `<did>#key-2`, … in
//! order of appearance in the DID string. This ordering is load-bearing:
//! identity creation zips freshly generated private keys against these
//! kids positionally, so resolution must reproduce the derivation-time
//! order exactly, every time, on every call.
//!
//! ## Materialization formats
//!
//! The same key can be materialized as JWK, raw base58, or multibase,
//! with the verification method `type` varying to match. All three carry
//! the same 32 raw bytes; [`VerificationMethod::raw_key`] gets them back
//! regardless of which format the document was resolved in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SERVICE_TYPE_DIDCOMM_MESSAGING;
use crate::crypto::keys::KeyRole;
use crate::peer::did::{DidError, ParsedPeerDid, PeerDid, VerificationKey};
use crate::peer::encoding::{b64url_decode, b64url_encode};

/// Errors specific to reading material back out of a resolved document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid verification material: {0}")]
    InvalidMaterial(String),
}

// ---------------------------------------------------------------------------
// Materialization
// ---------------------------------------------------------------------------

/// How key material is rendered inside a resolved document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// `publicKeyJwk` with an OKP JWK. The format the envelope engine's
    /// upstream consumers historically expect, so it's the default.
    #[default]
    Jwk,
    /// `publicKeyBase58`, raw key bytes in base58btc.
    Base58,
    /// `publicKeyMultibase`, multicodec-prefixed base58btc with `z` marker.
    Multibase,
}

/// An OKP JSON Web Key (public half only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    /// base64url-encoded raw public key bytes.
    pub x: String,
}

impl Jwk {
    fn for_key(key: &VerificationKey) -> Self {
        let crv = match key.role() {
            KeyRole::Authentication => "Ed25519",
            KeyRole::Agreement => "X25519",
        };
        Self {
            kty: "OKP".to_string(),
            crv: crv.to_string(),
            x: b64url_encode(key.raw()),
        }
    }
}

/// The key material field of a verification method, in one of the three
/// supported formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationMaterial {
    Jwk {
        #[serde(rename = "publicKeyJwk")]
        public_key_jwk: Jwk,
    },
    Base58 {
        #[serde(rename = "publicKeyBase58")]
        public_key_base58: String,
    },
    Multibase {
        #[serde(rename = "publicKeyMultibase")]
        public_key_multibase: String,
    },
}

/// A single key entry in a resolved DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// `<did>#key-N`.
    pub id: String,
    /// Key suite name; varies with role and materialization format.
    #[serde(rename = "type")]
    pub type_: String,
    /// The DID that controls this key — always the document's own DID
    /// for peer DIDs.
    pub controller: String,
    /// The key material itself.
    #[serde(flatten)]
    pub material: VerificationMaterial,
}

impl VerificationMethod {
    /// Recover the raw 32 public key bytes from whichever materialization
    /// this method carries.
    pub fn raw_key(&self) -> Result<[u8; 32], DocumentError> {
        let bytes = match &self.material {
            VerificationMaterial::Jwk { public_key_jwk } => b64url_decode(&public_key_jwk.x)
                .map_err(|e| DocumentError::InvalidMaterial(e.to_string()))?,
            VerificationMaterial::Base58 { public_key_base58 } => bs58::decode(public_key_base58)
                .into_vec()
                .map_err(|e| DocumentError::InvalidMaterial(e.to_string()))?,
            VerificationMaterial::Multibase {
                public_key_multibase,
            } => {
                let key = VerificationKey::from_multibase(public_key_multibase)
                    .map_err(|e| DocumentError::InvalidMaterial(e.to_string()))?;
                return Ok(*key.raw());
            }
        };
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| DocumentError::InvalidMaterial("expected 32 key bytes".into()))
    }
}

/// A service entry in a resolved document, expanded from the abbreviated
/// block embedded in the DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// `<did>#didcommmessaging-0`.
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
    #[serde(rename = "routingKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub routing_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
}

// ---------------------------------------------------------------------------
// DidDocument
// ---------------------------------------------------------------------------

/// A resolved peer DID document.
///
/// Derived purely from the DID string, never mutated, recomputed on every
/// [`resolve`] call. `authentication` and `key_agreement` hold kid
/// references into `verification_method`, preserving derivation order
/// within each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    pub id: String,
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    #[serde(rename = "keyAgreement")]
    pub key_agreement: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

impl DidDocument {
    /// Pretty-printed JSON, the form handed to external callers.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Parse a document back from JSON.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(|e| DocumentError::Serialization(e.to_string()))
    }

    /// Authentication kids, in derivation order.
    pub fn auth_kids(&self) -> &[String] {
        &self.authentication
    }

    /// Key-agreement kids, in derivation order.
    pub fn agreement_kids(&self) -> &[String] {
        &self.key_agreement
    }

    /// Look up a verification method by its kid.
    pub fn find_method(&self, kid: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|m| m.id == kid)
    }
}

/// Resolve a peer DID string into its document.
///
/// Fails with [`DidError::MalformedIdentifier`] when the string matches
/// neither numalgo grammar or an embedded encoding is invalid.
pub fn resolve(did: &str, format: KeyFormat) -> Result<DidDocument, DidError> {
    let parsed = PeerDid::parse(did)?;
    Ok(build_document(did, &parsed, format))
}

fn build_document(did: &str, parsed: &ParsedPeerDid, format: KeyFormat) -> DidDocument {
    let mut verification_method = Vec::with_capacity(parsed.keys.len());
    let mut authentication = Vec::new();
    let mut key_agreement = Vec::new();

    for (index, key) in parsed.keys.iter().enumerate() {
        let kid = format!("{}#key-{}", did, index + 1);
        verification_method.push(VerificationMethod {
            id: kid.clone(),
            type_: method_type(key.role(), format).to_string(),
            controller: did.to_string(),
            material: materialize(key, format),
        });
        match key.role() {
            KeyRole::Authentication => authentication.push(kid),
            KeyRole::Agreement => key_agreement.push(kid),
        }
    }

    let service = parsed
        .service
        .iter()
        .map(|s| Service {
            id: format!("{did}#didcommmessaging-0"),
            type_: SERVICE_TYPE_DIDCOMM_MESSAGING.to_string(),
            service_endpoint: s.endpoint.clone(),
            routing_keys: s.routing_keys.clone(),
            accept: s.accept.clone(),
        })
        .collect();

    DidDocument {
        id: did.to_string(),
        verification_method,
        authentication,
        key_agreement,
        service,
    }
}

fn method_type(role: KeyRole, format: KeyFormat) -> &'static str {
    match (role, format) {
        (_, KeyFormat::Jwk) => "JsonWebKey2020",
        (KeyRole::Authentication, KeyFormat::Base58) => "Ed25519VerificationKey2018",
        (KeyRole::Agreement, KeyFormat::Base58) => "X25519KeyAgreementKey2019",
        (KeyRole::Authentication, KeyFormat::Multibase) => "Ed25519VerificationKey2020",
        (KeyRole::Agreement, KeyFormat::Multibase) => "X25519KeyAgreementKey2020",
    }
}

fn materialize(key: &VerificationKey, format: KeyFormat) -> VerificationMaterial {
    match format {
        KeyFormat::Jwk => VerificationMaterial::Jwk {
            public_key_jwk: Jwk::for_key(key),
        },
        KeyFormat::Base58 => VerificationMaterial::Base58 {
            public_key_base58: bs58::encode(key.raw()).into_string(),
        },
        KeyFormat::Multibase => VerificationMaterial::Multibase {
            public_key_multibase: key.to_multibase(),
        },
    }
}

/// Resolve just the `(kid, raw key)` pairs for one role, in derivation
/// order. This is what the envelope engine actually consumes — it has no
/// use for materialization formats.
pub(crate) fn resolve_keys_for_role(
    did: &str,
    role: KeyRole,
) -> Result<Vec<(String, [u8; 32])>, DidError> {
    let parsed = PeerDid::parse(did)?;
    Ok(parsed
        .keys
        .iter()
        .enumerate()
        .filter(|(_, key)| key.role() == role)
        .map(|(index, key)| (format!("{}#key-{}", did, index + 1), *key.raw()))
        .collect())
}

/// Resolve the raw public key behind a single kid (`<did>#fragment`).
pub(crate) fn resolve_key_by_kid(kid: &str, role: KeyRole) -> Result<[u8; 32], DidError> {
    let (did, _fragment) = kid
        .split_once('#')
        .ok_or_else(|| DidError::MalformedIdentifier(format!("kid '{kid}' has no fragment")))?;
    resolve_keys_for_role(did, role)?
        .into_iter()
        .find(|(candidate, _)| candidate == kid)
        .map(|(_, raw)| raw)
        .ok_or_else(|| DidError::MalformedIdentifier(format!("kid '{kid}' not found in document")))
}
