// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Peer DID Layer
//!
//! Self-certifying identifiers: encode a set of public keys (plus an
//! optional service descriptor) into a `did:peer:` string, and resolve
//! that string back into a DID document. Derivation and resolution are
//! exact inverses — the identifier carries all the material, so
//! resolution needs no registry, no ledger, and no network.
//!
//! The stack, bottom up:
//!
//! 1. **encoding** — multicodec/multibase key encoding, base64url blocks.
//! 2. **did** — the two numalgo grammars, derivation policy, parsing.
//! 3. **document** — W3C-shaped document synthesis with deterministic,
//!    order-preserving key identifiers.

pub mod did;
pub mod document;
pub mod encoding;

pub use did::{DidError, Numalgo, ParsedPeerDid, PeerDid, ServiceDescriptor, VerificationKey};
pub use document::{
    resolve, DidDocument, DocumentError, Jwk, KeyFormat, Service, VerificationMaterial,
    VerificationMethod,
};
pub use encoding::EncodingError;
