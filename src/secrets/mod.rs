// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Secret Store
//!
//! The one piece of shared mutable state in the crate: a mapping from key
//! identifier (kid — `<did>#key-N`) to private key material.
//!
//! The store is a capability with exactly three operations — put, get,
//! has_key — expressed as the [`SecretStore`] trait so callers can swap
//! the default in-memory mapping for something hardware-backed or
//! encrypted at rest without the envelope engine noticing. The engine
//! takes the store as an explicit parameter on every call; there is no
//! process-wide singleton hiding in here.
//!
//! ## Semantics
//!
//! - kids are unique; `put` on an existing kid overwrites (last write
//!   wins). Callers use that for idempotent re-registration, never for
//!   correctness.
//! - Reads and writes are linearizable per kid: no lost writes, no torn
//!   key material. The in-memory implementation gets this from a single
//!   `parking_lot::RwLock` around the map.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::crypto::keys::{AgreementKeypair, KeyRole, SigningKeypair};

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// Private key material registered under a kid.
///
/// The 32-byte seed plus the role that says how to rehydrate it
/// (Ed25519 signing key vs X25519 static secret). Serializable so that
/// durable store implementations can persist entries, but the default
/// in-memory store never writes anything anywhere.
#[derive(Clone, Serialize, Deserialize)]
pub struct Secret {
    /// Key identifier: DID plus fragment.
    pub kid: String,
    /// Which algorithm this seed belongs to.
    pub role: KeyRole,
    /// The raw 32-byte secret seed.
    pub seed: [u8; 32],
}

impl Secret {
    pub fn new(kid: impl Into<String>, role: KeyRole, seed: [u8; 32]) -> Self {
        Self {
            kid: kid.into(),
            role,
            seed,
        }
    }

    /// Rehydrate as a signing keypair. `None` if the role doesn't match.
    pub fn signing_keypair(&self) -> Option<SigningKeypair> {
        match self.role {
            KeyRole::Authentication => Some(SigningKeypair::from_seed(&self.seed)),
            KeyRole::Agreement => None,
        }
    }

    /// Rehydrate as an agreement keypair. `None` if the role doesn't match.
    pub fn agreement_keypair(&self) -> Option<AgreementKeypair> {
        match self.role {
            KeyRole::Agreement => Some(AgreementKeypair::from_seed(&self.seed)),
            KeyRole::Authentication => None,
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // kid and role only. The seed stays out of logs, always.
        write!(f, "Secret(kid={}, role={})", self.kid, self.role)
    }
}

// ---------------------------------------------------------------------------
// SecretStore trait
// ---------------------------------------------------------------------------

/// Pluggable private key storage.
///
/// Implementations must make each operation atomic per kid under
/// concurrent access. `Send + Sync` because pack/unpack calls may run on
/// any thread.
pub trait SecretStore: Send + Sync {
    /// Register (or overwrite) the secret for its kid.
    fn put(&self, secret: Secret);

    /// Fetch the secret for a kid, if present.
    fn get(&self, kid: &str) -> Option<Secret>;

    /// Whether a secret is registered under this kid.
    fn has_key(&self, kid: &str) -> bool;
}

// A shared reference to a store is itself a store, so an agent can
// borrow a store that outlives it instead of owning one.
impl<S: SecretStore + ?Sized> SecretStore for &S {
    fn put(&self, secret: Secret) {
        (**self).put(secret)
    }

    fn get(&self, kid: &str) -> Option<Secret> {
        (**self).get(kid)
    }

    fn has_key(&self, kid: &str) -> bool {
        (**self).has_key(kid)
    }
}

// ---------------------------------------------------------------------------
// InMemorySecretStore
// ---------------------------------------------------------------------------

/// The default store: a lock-guarded map with no persistence across
/// process lifetimes.
#[derive(Default)]
pub struct InMemorySecretStore {
    entries: RwLock<HashMap<String, Secret>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All registered kids, unordered. Test and diagnostic helper.
    pub fn kids(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of registered secrets.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SecretStore for InMemorySecretStore {
    fn put(&self, secret: Secret) {
        self.entries.write().insert(secret.kid.clone(), secret);
    }

    fn get(&self, kid: &str) -> Option<Secret> {
        self.entries.read().get(kid).cloned()
    }

    fn has_key(&self, kid: &str) -> bool {
        self.entries.read().contains_key(kid)
    }
}

impl fmt::Debug for InMemorySecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InMemorySecretStore(len={})", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn secret(kid: &str, fill: u8) -> Secret {
        Secret::new(kid, KeyRole::Agreement, [fill; 32])
    }

    #[test]
    fn put_get_roundtrip() {
        let store = InMemorySecretStore::new();
        store.put(secret("did:peer:2.Ez#key-1", 1));
        let fetched = store.get("did:peer:2.Ez#key-1").unwrap();
        assert_eq!(fetched.seed, [1u8; 32]);
        assert!(store.has_key("did:peer:2.Ez#key-1"));
    }

    #[test]
    fn missing_kid_returns_none() {
        let store = InMemorySecretStore::new();
        assert!(store.get("did:peer:0z6Mk#key-1").is_none());
        assert!(!store.has_key("did:peer:0z6Mk#key-1"));
    }

    #[test]
    fn put_overwrites_last_write_wins() {
        let store = InMemorySecretStore::new();
        store.put(secret("kid", 1));
        store.put(secret("kid", 2));
        assert_eq!(store.get("kid").unwrap().seed, [2u8; 32]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn role_mismatched_rehydration_returns_none() {
        let s = Secret::new("kid", KeyRole::Agreement, [3u8; 32]);
        assert!(s.signing_keypair().is_none());
        assert!(s.agreement_keypair().is_some());
    }

    #[test]
    fn rehydrated_keypair_matches_seed() {
        let kp = SigningKeypair::generate();
        let s = Secret::new("kid", KeyRole::Authentication, kp.secret_bytes());
        let restored = s.signing_keypair().unwrap();
        assert_eq!(restored.public_bytes(), kp.public_bytes());
    }

    #[test]
    fn debug_never_prints_seed() {
        let s = secret("kid", 0xAB);
        let debug_str = format!("{:?}", s);
        assert!(!debug_str.contains("171")); // 0xAB
        assert!(!debug_str.contains("ab"));
    }

    #[test]
    fn concurrent_puts_and_reads_do_not_corrupt() {
        let store = Arc::new(InMemorySecretStore::new());
        let mut handles = Vec::new();
        for t in 0..8u8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..100u8 {
                    let kid = format!("did#key-{}", i % 10);
                    store.put(Secret::new(&kid, KeyRole::Agreement, [t.wrapping_add(i); 32]));
                    if let Some(s) = store.get(&kid) {
                        // A read must always see a complete 32-byte seed
                        // written by *some* put — never a torn mix.
                        let first = s.seed[0];
                        assert!(s.seed.iter().all(|&b| b == first));
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 10);
    }
}
