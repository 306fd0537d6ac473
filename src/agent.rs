// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Agent
//!
//! The top-level convenience surface: one object that owns (or borrows)
//! a secret store and exposes the four operations a messaging party
//! needs — mint an identity, resolve someone's DID to a document, pack
//! a message, unpack one.
//!
//! Everything here is a thin composition of the lower layers; no
//! cryptography or encoding lives in this file. Two parties talking to
//! each other are simply two `Agent`s over two different stores.
//!
//! ```no_run
//! use didcomm_peer::agent::Agent;
//! use didcomm_peer::envelope::PackOptions;
//!
//! let alice = Agent::new();
//! let bob = Agent::new();
//!
//! let alice_did = alice.create_identity(1, 1, None, Vec::new())?;
//! let bob_did = bob.create_identity(1, 1, None, Vec::new())?;
//!
//! let packed = alice.pack_message(
//!     "hello bob",
//!     &bob_did,
//!     Some(&alice_did),
//!     &PackOptions::default(),
//! )?;
//! let (message, from, to) = bob.unpack_message(&packed)?;
//! assert_eq!(message.text(), Some("hello bob"));
//! assert_eq!(from.as_deref(), Some(alice_did.as_str()));
//! assert_eq!(to, bob_did);
//! # Ok::<(), didcomm_peer::agent::AgentError>(())
//! ```

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::keys::{AgreementKeypair, KeyRole, SigningKeypair};
use crate::envelope::pack::{pack_encrypted, PackError, PackOptions};
use crate::envelope::unpack::{unpack, UnpackError, UnpackResult};
use crate::envelope::wire::Message;
use crate::peer::did::{DidError, PeerDid, ServiceDescriptor, VerificationKey};
use crate::peer::document::{resolve, DocumentError, KeyFormat};
use crate::secrets::{InMemorySecretStore, Secret, SecretStore};

/// Umbrella error for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Did(#[from] DidError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Unpack(#[from] UnpackError),
}

/// A messaging party: a secret store plus the operations over it.
pub struct Agent<S: SecretStore = InMemorySecretStore> {
    secrets: S,
}

impl Agent<InMemorySecretStore> {
    /// An agent over its own fresh in-memory store.
    pub fn new() -> Self {
        Self {
            secrets: InMemorySecretStore::new(),
        }
    }
}

impl Default for Agent<InMemorySecretStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SecretStore> Agent<S> {
    /// An agent over an existing store. The store may be shared: `&T`
    /// implements [`SecretStore`] whenever `T` does.
    pub fn with_store(secrets: S) -> Self {
        Self { secrets }
    }

    /// The underlying store.
    pub fn secrets(&self) -> &S {
        &self.secrets
    }

    /// Generate fresh keypairs, derive the peer DID they determine, and
    /// register every private key in the store under its kid.
    ///
    /// Exactly one authentication key, no agreement keys, and no service
    /// yields the single-key DID form; anything else yields the
    /// multi-key form. Key identifiers are `<did>#key-N` numbered in the
    /// order the keys appear in the DID itself, so the stored kids match
    /// what resolution (ours or a remote party's) will produce.
    pub fn create_identity(
        &self,
        auth_count: usize,
        agreement_count: usize,
        endpoint: Option<&str>,
        routing_keys: Vec<String>,
    ) -> Result<String, AgentError> {
        let mut auth_seeds = Vec::with_capacity(auth_count);
        let mut auth_keys = Vec::with_capacity(auth_count);
        for _ in 0..auth_count {
            let seed = random_seed();
            auth_keys.push(VerificationKey::from_signing(&SigningKeypair::from_seed(
                &seed,
            )));
            auth_seeds.push(seed);
        }

        let mut agreement_seeds = Vec::with_capacity(agreement_count);
        let mut agreement_keys = Vec::with_capacity(agreement_count);
        for _ in 0..agreement_count {
            let seed = random_seed();
            agreement_keys.push(VerificationKey::from_agreement(
                &AgreementKeypair::from_seed(&seed),
            ));
            agreement_seeds.push(seed);
        }

        let service = endpoint.map(|e| ServiceDescriptor::new(e).with_routing_keys(routing_keys));
        let did = PeerDid::derive(&auth_keys, &agreement_keys, service.as_ref())?;

        // Store each secret under the kid its public half will carry in
        // the resolved document: agreement keys appear before
        // authentication keys in the multi-key form, so they take the
        // low numbers.
        let ordered = agreement_seeds
            .into_iter()
            .map(|seed| (KeyRole::Agreement, seed))
            .chain(
                auth_seeds
                    .into_iter()
                    .map(|seed| (KeyRole::Authentication, seed)),
            );
        for (index, (role, seed)) in ordered.enumerate() {
            self.secrets
                .put(Secret::new(format!("{}#key-{}", did, index + 1), role, seed));
        }

        info!(did = %did, auth_count, agreement_count, "created identity");
        Ok(did.as_str().to_string())
    }

    /// Resolve any peer DID (ours or not) to its DID document, rendered
    /// as pretty-printed JSON in the requested key format.
    pub fn resolve_identity(&self, did: &str, format: KeyFormat) -> Result<String, AgentError> {
        let document = resolve(did, format)?;
        Ok(document.to_json()?)
    }

    /// Encrypt a basic text message to `to`. With a `from`, the envelope
    /// authenticates the sender; without one it is anonymous. Signing
    /// and sender hiding come from `options`.
    pub fn pack_message(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
        options: &PackOptions,
    ) -> Result<String, AgentError> {
        debug!(to = %to, authenticated = from.is_some(), "packing message");
        let message = Message::basic(text, to, from);
        Ok(pack_encrypted(&self.secrets, &message, to, from, options)?)
    }

    /// Decrypt and verify an envelope, returning the message, the
    /// authenticated sender DID (if any), and the recipient DID whose
    /// key opened it.
    pub fn unpack_message(
        &self,
        packed: &str,
    ) -> Result<(Message, Option<String>, String), AgentError> {
        let result = self.unpack_detailed(packed)?;
        Ok((result.message, result.sender, result.recipient))
    }

    /// Like [`unpack_message`](Self::unpack_message) but with the full
    /// protection metadata.
    pub fn unpack_detailed(&self, packed: &str) -> Result<UnpackResult, AgentError> {
        Ok(unpack(&self.secrets, packed)?)
    }
}

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NUMALGO_0_PREFIX, NUMALGO_2_PREFIX};
    use crate::peer::did::Numalgo;

    #[test]
    fn single_key_identity_uses_the_inception_form() {
        let agent = Agent::new();
        let did = agent.create_identity(1, 0, None, Vec::new()).unwrap();
        assert!(did.starts_with(NUMALGO_0_PREFIX));
        assert_eq!(
            PeerDid::parse(&did).unwrap().algorithm,
            Numalgo::InceptionKey
        );
    }

    #[test]
    fn multi_key_identity_uses_the_multikey_form() {
        let agent = Agent::new();
        let did = agent.create_identity(1, 1, None, Vec::new()).unwrap();
        assert!(did.starts_with(NUMALGO_2_PREFIX));
    }

    #[test]
    fn endpoint_forces_the_multikey_form() {
        let agent = Agent::new();
        let did = agent
            .create_identity(1, 0, Some("https://relay.example/endpoint"), Vec::new())
            .unwrap();
        assert!(did.starts_with(NUMALGO_2_PREFIX));
        let parsed = PeerDid::parse(&did).unwrap();
        assert_eq!(
            parsed.service.unwrap().endpoint,
            "https://relay.example/endpoint"
        );
    }

    #[test]
    fn zero_auth_keys_is_rejected() {
        let agent = Agent::new();
        assert!(matches!(
            agent.create_identity(0, 2, None, Vec::new()),
            Err(AgentError::Did(DidError::InvalidKeySet(_)))
        ));
    }

    #[test]
    fn stored_kids_match_resolved_kids() {
        let agent = Agent::new();
        let did = agent.create_identity(2, 3, None, Vec::new()).unwrap();
        let document = resolve(&did, KeyFormat::Jwk).unwrap();

        for kid in document
            .agreement_kids()
            .into_iter()
            .chain(document.auth_kids())
        {
            assert!(agent.secrets().has_key(&kid), "missing secret for {kid}");
        }
        assert_eq!(agent.secrets().len(), 5);
    }

    #[test]
    fn stored_secrets_regenerate_the_published_keys() {
        let agent = Agent::new();
        let did = agent.create_identity(1, 2, None, Vec::new()).unwrap();
        let parsed = PeerDid::parse(&did).unwrap();

        // key-1 and key-2 are the agreement keys, key-3 the signing key.
        for (index, key) in parsed.keys.iter().enumerate() {
            let secret = agent
                .secrets()
                .get(&format!("{}#key-{}", did, index + 1))
                .unwrap();
            let public = match secret.role {
                KeyRole::Agreement => secret.agreement_keypair().unwrap().public_bytes(),
                KeyRole::Authentication => secret.signing_keypair().unwrap().public_bytes(),
            };
            assert_eq!(public, *key.raw());
            assert_eq!(secret.role, key.role());
        }
    }

    #[test]
    fn resolve_identity_renders_pretty_json() {
        let agent = Agent::new();
        let did = agent.create_identity(1, 1, None, Vec::new()).unwrap();
        let json = agent.resolve_identity(&did, KeyFormat::Jwk).unwrap();
        assert!(json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["id"], serde_json::Value::String(did));
    }

    #[test]
    fn two_agents_exchange_a_message() {
        let alice = Agent::new();
        let bob = Agent::new();
        let alice_did = alice.create_identity(1, 1, None, Vec::new()).unwrap();
        let bob_did = bob.create_identity(1, 1, None, Vec::new()).unwrap();

        let packed = alice
            .pack_message("hi bob", &bob_did, Some(&alice_did), &PackOptions::default())
            .unwrap();
        let (message, from, to) = bob.unpack_message(&packed).unwrap();
        assert_eq!(message.text(), Some("hi bob"));
        assert_eq!(from.as_deref(), Some(alice_did.as_str()));
        assert_eq!(to, bob_did);

        // Alice's own agent cannot read what she sent to Bob.
        assert!(alice.unpack_message(&packed).is_err());
    }
}
