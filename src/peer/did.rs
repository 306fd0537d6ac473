// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Peer DID Derivation
//!
//! Deterministic encoding of public key material (plus an optional
//! service descriptor) into a self-certifying `did:peer:` identifier,
//! and the strict parse back out. No ledger, no registry, no network:
//! the identifier *is* the key material.
//!
//! ## The two numalgos
//!
//! - **numalgo0** — `did:peer:0z<multibase-key>`. The most compact form:
//!   a single authentication key inlined directly. Chosen automatically
//!   when the identity is exactly one auth key, no agreement keys, no
//!   service.
//! - **numalgo2** — `did:peer:2.Ez<key>.Vz<key>...S<service>`. The
//!   general form: a dot-separated sequence of tagged elements, one per
//!   agreement key (`E`), one per authentication key (`V`), and at most
//!   one base64url service block (`S`). Element order is load-bearing —
//!   resolution numbers key identifiers by order of appearance, and
//!   callers zip private keys against those identifiers positionally.
//!
//! ## Derivation policy
//!
//! numalgo2 requires at least one authentication key. An identity that
//! can be written to but never held accountable for anything it says is
//! not something this crate will mint; agreement-only key sets fail with
//! [`DidError::InvalidKeySet`]. This is a deliberate tightening relative
//! to some peer DID implementations, and it lives here and only here.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{
    ELEMENT_AGREEMENT, ELEMENT_AUTHENTICATION, ELEMENT_SERVICE, NUMALGO_0_PREFIX,
    NUMALGO_2_PREFIX, SERVICE_ACCEPT_DIDCOMM_V2,
};
use crate::crypto::keys::{validate_verifying_key, AgreementKeypair, KeyRole, SigningKeypair};
use crate::peer::encoding::{
    b64url_decode, b64url_encode, decode_multibase_key, encode_multibase_key, EncodingError,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from deriving or parsing peer DIDs.
#[derive(Debug, Error)]
pub enum DidError {
    /// The supplied key set cannot be encoded under the derivation policy.
    #[error("invalid key set: {0}")]
    InvalidKeySet(String),

    /// The string does not match either numalgo's grammar, or an embedded
    /// encoding is invalid.
    #[error("malformed peer DID: {0}")]
    MalformedIdentifier(String),

    /// An embedded key or service block failed to decode.
    #[error("malformed peer DID: {0}")]
    Encoding(#[from] EncodingError),
}

// ---------------------------------------------------------------------------
// VerificationKey
// ---------------------------------------------------------------------------

/// A public key tagged with the role it plays in an identity.
///
/// The input unit of DID derivation: raw 32 key bytes plus the role that
/// decides its multicodec tag and which DID document list it resolves
/// into. Constructors validate that the bytes make sense for the role
/// where validation is possible (Ed25519 points are checked; any 32 bytes
/// are a legal X25519 public key).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationKey {
    role: KeyRole,
    raw: [u8; 32],
}

impl VerificationKey {
    /// An authentication (Ed25519) key. Rejects bytes that are not a
    /// valid curve point.
    pub fn authentication(raw: [u8; 32]) -> Result<Self, DidError> {
        validate_verifying_key(&raw)
            .map_err(|_| DidError::InvalidKeySet("not a valid Ed25519 public key".into()))?;
        Ok(Self {
            role: KeyRole::Authentication,
            raw,
        })
    }

    /// An agreement (X25519) key.
    pub fn agreement(raw: [u8; 32]) -> Self {
        Self {
            role: KeyRole::Agreement,
            raw,
        }
    }

    /// The public half of a signing keypair.
    pub fn from_signing(keypair: &SigningKeypair) -> Self {
        Self {
            role: KeyRole::Authentication,
            raw: keypair.public_bytes(),
        }
    }

    /// The public half of an agreement keypair.
    pub fn from_agreement(keypair: &AgreementKeypair) -> Self {
        Self {
            role: KeyRole::Agreement,
            raw: keypair.public_bytes(),
        }
    }

    /// Decode from a multibase string; the role comes from the codec tag.
    pub fn from_multibase(encoded: &str) -> Result<Self, DidError> {
        let (role, raw) = decode_multibase_key(encoded)?;
        Ok(Self { role, raw })
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn raw(&self) -> &[u8; 32] {
        &self.raw
    }

    /// Multibase form, as embedded in a numalgo2 element or numalgo0 body.
    pub fn to_multibase(&self) -> String {
        encode_multibase_key(self.role, &self.raw)
    }
}

// ---------------------------------------------------------------------------
// ServiceDescriptor
// ---------------------------------------------------------------------------

/// A DIDComm messaging service advertised by an identity.
///
/// Optional: only identities with a reachable endpoint carry one. Encoded
/// into the DID as a base64url block over the abbreviated JSON form the
/// peer DID method defines (`t`/`s`/`r`/`a` field names), and expanded
/// back to full field names at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Where to deliver envelopes for this identity.
    pub endpoint: String,
    /// Mediator keys the envelope must be forwarded through, outermost
    /// first. Empty for directly reachable endpoints.
    #[serde(default)]
    pub routing_keys: Vec<String>,
    /// Protocol versions the endpoint accepts.
    #[serde(default)]
    pub accept: Vec<String>,
}

impl ServiceDescriptor {
    /// A directly reachable DIDComm v2 endpoint with no routing.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            routing_keys: Vec::new(),
            accept: vec![SERVICE_ACCEPT_DIDCOMM_V2.to_string()],
        }
    }

    /// Attach mediator routing keys.
    pub fn with_routing_keys(mut self, routing_keys: Vec<String>) -> Self {
        self.routing_keys = routing_keys;
        self
    }

    /// Encode as the base64url service block body (without the `S` tag).
    fn encode(&self) -> Result<String, DidError> {
        let abbreviated = AbbreviatedService {
            service_type: ABBREVIATED_TYPE_DIDCOMM.to_string(),
            endpoint: self.endpoint.clone(),
            routing_keys: self.routing_keys.clone(),
            accept: self.accept.clone(),
        };
        let json = serde_json::to_string(&abbreviated)
            .map_err(|e| DidError::MalformedIdentifier(format!("service encoding: {e}")))?;
        Ok(b64url_encode(json.as_bytes()))
    }

    /// Decode the base64url service block body.
    fn decode(block: &str) -> Result<Self, DidError> {
        let json = b64url_decode(block)?;
        let abbreviated: AbbreviatedService = serde_json::from_slice(&json)
            .map_err(|_| DidError::MalformedIdentifier("invalid service block JSON".into()))?;
        if abbreviated.service_type != ABBREVIATED_TYPE_DIDCOMM {
            return Err(DidError::MalformedIdentifier(format!(
                "unknown service type tag '{}'",
                abbreviated.service_type
            )));
        }
        Ok(Self {
            endpoint: abbreviated.endpoint,
            routing_keys: abbreviated.routing_keys,
            accept: abbreviated.accept,
        })
    }
}

/// Abbreviated type tag for [`crate::config::SERVICE_TYPE_DIDCOMM_MESSAGING`]
/// in the encoded block.
const ABBREVIATED_TYPE_DIDCOMM: &str = "dm";

/// The minified wire form of a service block. Single-letter field names
/// keep the DID short; resolution expands them.
#[derive(Serialize, Deserialize)]
struct AbbreviatedService {
    #[serde(rename = "t")]
    service_type: String,
    #[serde(rename = "s")]
    endpoint: String,
    #[serde(rename = "r", default, skip_serializing_if = "Vec::is_empty")]
    routing_keys: Vec<String>,
    #[serde(rename = "a", default, skip_serializing_if = "Vec::is_empty")]
    accept: Vec<String>,
}

// ---------------------------------------------------------------------------
// PeerDid
// ---------------------------------------------------------------------------

/// Which encoding algorithm a peer DID uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numalgo {
    /// Single inline authentication key.
    InceptionKey, // numalgo0
    /// Multi-key with optional service.
    MultiKey, // numalgo2
}

/// A derived peer DID string.
///
/// Construction always goes through [`PeerDid::derive`] or
/// [`PeerDid::parse`], so holding one of these means the string matched
/// a supported grammar at least once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerDid(String);

/// The fully decoded content of a peer DID: every embedded key in order
/// of appearance, plus the service if present.
#[derive(Debug, Clone)]
pub struct ParsedPeerDid {
    /// Which numalgo the string used.
    pub algorithm: Numalgo,
    /// All embedded keys, in order of appearance in the DID string.
    /// Resolution numbers kids from this order.
    pub keys: Vec<VerificationKey>,
    /// The decoded service block, if any.
    pub service: Option<ServiceDescriptor>,
}

impl PeerDid {
    /// Derive a peer DID from ordered key lists and an optional service.
    ///
    /// Deterministic: the same inputs always produce the same string.
    /// Selects numalgo0 for the single-auth-key bare identity, numalgo2
    /// otherwise. numalgo2 encodes agreement keys first, then
    /// authentication keys, then the service block, each in the order
    /// supplied — callers rely on that order to match private keys to
    /// resolved key identifiers.
    ///
    /// # Errors
    ///
    /// [`DidError::InvalidKeySet`] if a key appears in the wrong role's
    /// list, or if the numalgo2 path is reached with no authentication
    /// keys (including the fully empty key set).
    pub fn derive(
        auth_keys: &[VerificationKey],
        agreement_keys: &[VerificationKey],
        service: Option<&ServiceDescriptor>,
    ) -> Result<Self, DidError> {
        for key in auth_keys {
            if key.role() != KeyRole::Authentication {
                return Err(DidError::InvalidKeySet(
                    "agreement key supplied in the authentication list".into(),
                ));
            }
        }
        for key in agreement_keys {
            if key.role() != KeyRole::Agreement {
                return Err(DidError::InvalidKeySet(
                    "authentication key supplied in the agreement list".into(),
                ));
            }
        }

        if auth_keys.len() == 1 && agreement_keys.is_empty() && service.is_none() {
            return Ok(Self(format!(
                "{}{}",
                NUMALGO_0_PREFIX,
                auth_keys[0].to_multibase()
            )));
        }

        // numalgo2 policy: at least one signing key, always.
        if auth_keys.is_empty() {
            return Err(DidError::InvalidKeySet(
                "numalgo2 requires at least one authentication key".into(),
            ));
        }

        let mut did = String::from(NUMALGO_2_PREFIX);
        for key in agreement_keys {
            did.push('.');
            did.push(ELEMENT_AGREEMENT);
            did.push_str(&key.to_multibase());
        }
        for key in auth_keys {
            did.push('.');
            did.push(ELEMENT_AUTHENTICATION);
            did.push_str(&key.to_multibase());
        }
        if let Some(service) = service {
            did.push('.');
            did.push(ELEMENT_SERVICE);
            did.push_str(&service.encode()?);
        }
        Ok(Self(did))
    }

    /// Parse and validate a peer DID string, decoding every embedded key
    /// and the service block.
    ///
    /// # Errors
    ///
    /// [`DidError::MalformedIdentifier`] (or [`DidError::Encoding`]) when
    /// the string matches neither grammar, an element tag is unknown, a
    /// key fails to decode, a key's codec contradicts its element tag, or
    /// more than one service block is present.
    pub fn parse(did: &str) -> Result<ParsedPeerDid, DidError> {
        if let Some(body) = did.strip_prefix(NUMALGO_0_PREFIX) {
            let key = VerificationKey::from_multibase(body)?;
            if key.role() != KeyRole::Authentication {
                return Err(DidError::MalformedIdentifier(
                    "numalgo0 must inline an authentication key".into(),
                ));
            }
            return Ok(ParsedPeerDid {
                algorithm: Numalgo::InceptionKey,
                keys: vec![key],
                service: None,
            });
        }

        let Some(body) = did.strip_prefix(NUMALGO_2_PREFIX) else {
            return Err(DidError::MalformedIdentifier(
                "expected 'did:peer:0' or 'did:peer:2' prefix".into(),
            ));
        };

        let mut keys = Vec::new();
        let mut service = None;
        for (index, element) in body.split('.').enumerate() {
            if element.is_empty() {
                // The separator before the first element produces one
                // empty split; an empty element anywhere else means a
                // double dot.
                if index == 0 {
                    continue;
                }
                return Err(DidError::MalformedIdentifier("empty element".into()));
            }
            let tag = element.chars().next().unwrap();
            let value = &element[tag.len_utf8()..];
            match tag {
                t if t == ELEMENT_AGREEMENT => {
                    let key = VerificationKey::from_multibase(value)?;
                    if key.role() != KeyRole::Agreement {
                        return Err(DidError::MalformedIdentifier(
                            "E element does not contain an X25519 key".into(),
                        ));
                    }
                    keys.push(key);
                }
                t if t == ELEMENT_AUTHENTICATION => {
                    let key = VerificationKey::from_multibase(value)?;
                    if key.role() != KeyRole::Authentication {
                        return Err(DidError::MalformedIdentifier(
                            "V element does not contain an Ed25519 key".into(),
                        ));
                    }
                    keys.push(key);
                }
                t if t == ELEMENT_SERVICE => {
                    if service.is_some() {
                        return Err(DidError::MalformedIdentifier(
                            "multiple service blocks".into(),
                        ));
                    }
                    service = Some(ServiceDescriptor::decode(value)?);
                }
                other => {
                    return Err(DidError::MalformedIdentifier(format!(
                        "unknown element tag '{other}'"
                    )));
                }
            }
        }

        if keys.is_empty() {
            return Err(DidError::MalformedIdentifier(
                "numalgo2 DID contains no keys".into(),
            ));
        }

        Ok(ParsedPeerDid {
            algorithm: Numalgo::MultiKey,
            keys,
            service,
        })
    }

    /// Whether a string is a valid peer DID under either grammar.
    pub fn is_peer_did(did: &str) -> bool {
        Self::parse(did).is_ok()
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ParsedPeerDid {
    /// Authentication keys in appearance order.
    pub fn auth_keys(&self) -> Vec<VerificationKey> {
        self.keys
            .iter()
            .copied()
            .filter(|k| k.role() == KeyRole::Authentication)
            .collect()
    }

    /// Agreement keys in appearance order.
    pub fn agreement_keys(&self) -> Vec<VerificationKey> {
        self.keys
            .iter()
            .copied()
            .filter(|k| k.role() == KeyRole::Agreement)
            .collect()
    }
}
