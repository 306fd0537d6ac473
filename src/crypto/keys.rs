// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Key Pair Generation
//!
//! Ed25519 signing keypairs and X25519 agreement keypairs — the two kinds
//! of asymmetric key material a peer DID identity is built from.
//!
//! Every identity carries:
//!
//! - **Authentication keys** (Ed25519) — prove who said something.
//! - **Agreement keys** (X25519) — let others encrypt *to* you via
//!   Diffie-Hellman.
//!
//! Same curve underneath (Curve25519), different coordinate systems,
//! deliberately separate key material. We never convert an Ed25519 key
//! into its X25519 twin — cross-protocol key reuse is how you end up in
//! a CVE database.
//!
//! ## Security considerations
//!
//! - All generation uses OS-level RNG (`OsRng`). No userspace PRNG, no
//!   seeding games outside of tests.
//! - Secret bytes never appear in `Debug` output. If you add logging to
//!   this module, read it twice before committing.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::config::{SIGNATURE_LENGTH, SIGNING_KEY_LENGTH};

/// Errors that can occur during key operations.
///
/// Kept deliberately vague — the distinction between "wrong length" and
/// "not a valid curve point" is of no use to honest callers and of great
/// use to dishonest ones.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected {SIGNATURE_LENGTH} bytes")]
    InvalidSignature,
}

/// The two roles asymmetric key material can play in an identity.
///
/// The role decides the algorithm: authentication keys sign (Ed25519),
/// agreement keys do Diffie-Hellman (X25519). It also decides how the key
/// is tagged inside a peer DID and which list of a DID document it lands
/// in, so the role travels with the key everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    /// Ed25519 signing key. Proves authorship.
    Authentication,
    /// X25519 key-agreement key. Receives encrypted traffic.
    Agreement,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::Authentication => write!(f, "authentication"),
            KeyRole::Agreement => write!(f, "agreement"),
        }
    }
}

// ---------------------------------------------------------------------------
// SigningKeypair (Ed25519)
// ---------------------------------------------------------------------------

/// An Ed25519 keypair used for the authentication role.
///
/// Signs message payloads and backs the `authentication` section of a DID
/// document. Signatures are deterministic (RFC 8032) — same key, same
/// message, same 64 bytes, every time.
///
/// Intentionally does NOT implement `Serialize`: exporting secret material
/// must be an explicit `secret_bytes()` call, not a side effect of sticking
/// a keypair into a JSON structure.
pub struct SigningKeypair {
    signing_key: SigningKey,
}

impl SigningKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the secret key *is* the seed. Useful for tests and for
    /// rehydrating stored secrets; with a weak seed you get a weak key.
    pub fn from_seed(seed: &[u8; SIGNING_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The raw 32-byte public key.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Export the raw 32-byte secret seed. Handle with care — this is the
    /// whole identity.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message, producing a 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for SigningKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only. Always.
        write!(f, "SigningKeypair(pub={})", hex::encode(self.public_bytes()))
    }
}

/// Verify an Ed25519 signature against a raw 32-byte public key.
///
/// Returns `false` for any failure — bad point, bad length, bad signature.
/// Callers that need to distinguish structural errors from forgeries should
/// validate the key separately with [`validate_verifying_key`].
pub fn verify_signature(public: &[u8; 32], message: &[u8], signature: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public) else {
        return false;
    };
    let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    verifying_key
        .verify(message, &DalekSignature::from_bytes(&sig_bytes))
        .is_ok()
}

/// Check that 32 bytes decode to a valid Ed25519 point.
///
/// Catches low-order points and other degenerate encodings before they
/// reach a verification call.
pub fn validate_verifying_key(public: &[u8; 32]) -> Result<(), KeyError> {
    VerifyingKey::from_bytes(public).map_err(|_| KeyError::InvalidPublicKey)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// AgreementKeypair (X25519)
// ---------------------------------------------------------------------------

/// An X25519 keypair used for the agreement role.
///
/// This is a *static* secret, not an ephemeral one: agreement keys are
/// long-lived identity keys that must survive arbitrarily many
/// Diffie-Hellman operations (one per envelope received). Ephemeral
/// single-use secrets are created inline by the envelope engine at pack
/// time and never stored.
pub struct AgreementKeypair {
    secret: StaticSecret,
}

impl AgreementKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// x25519-dalek clamps the scalar internally, so any 32 bytes are
    /// accepted; clamped bytes round-trip unchanged.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            secret: StaticSecret::from(*seed),
        }
    }

    /// The raw 32-byte public key.
    pub fn public_bytes(&self) -> [u8; 32] {
        X25519PublicKey::from(&self.secret).to_bytes()
    }

    /// Export the raw 32-byte (clamped) secret scalar.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Compute the X25519 shared secret with a peer public key.
    ///
    /// The raw DH output has algebraic structure and is never used as a
    /// symmetric key directly — it always goes through the KDF in
    /// [`crate::crypto::kdf`] first.
    pub fn diffie_hellman(&self, peer_public: &[u8; 32]) -> [u8; 32] {
        let peer = X25519PublicKey::from(*peer_public);
        self.secret.diffie_hellman(&peer).to_bytes()
    }
}

impl Clone for AgreementKeypair {
    fn clone(&self) -> Self {
        Self {
            secret: StaticSecret::from(self.secret.to_bytes()),
        }
    }
}

impl fmt::Debug for AgreementKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AgreementKeypair(pub={})",
            hex::encode(self.public_bytes())
        )
    }
}

// ---------------------------------------------------------------------------
// Role-dispatched generation
// ---------------------------------------------------------------------------

/// A keypair of either role.
///
/// The role-dispatched form of the generator contract: callers that build
/// identities from a requested mix of key counts (the agent does) ask for
/// keys by role and get back the right algorithm without matching on it
/// themselves.
pub enum Keypair {
    /// Ed25519, authentication role.
    Signing(SigningKeypair),
    /// X25519, agreement role.
    Agreement(AgreementKeypair),
}

impl Keypair {
    /// Generate a fresh keypair for the given role.
    ///
    /// Entropy failure inside `OsRng` aborts the process — there is no
    /// meaningful recovery from a broken system RNG, and limping on with
    /// weak keys is worse than dying loudly.
    pub fn generate(role: KeyRole) -> Self {
        match role {
            KeyRole::Authentication => Keypair::Signing(SigningKeypair::generate()),
            KeyRole::Agreement => Keypair::Agreement(AgreementKeypair::generate()),
        }
    }

    /// The role this keypair serves.
    pub fn role(&self) -> KeyRole {
        match self {
            Keypair::Signing(_) => KeyRole::Authentication,
            Keypair::Agreement(_) => KeyRole::Agreement,
        }
    }

    /// The raw 32-byte public key, regardless of role.
    pub fn public_bytes(&self) -> [u8; 32] {
        match self {
            Keypair::Signing(kp) => kp.public_bytes(),
            Keypair::Agreement(kp) => kp.public_bytes(),
        }
    }

    /// The raw 32-byte secret, regardless of role.
    pub fn secret_bytes(&self) -> [u8; 32] {
        match self {
            Keypair::Signing(kp) => kp.secret_bytes(),
            Keypair::Agreement(kp) => kp.secret_bytes(),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Keypair(role={}, pub={})",
            self.role(),
            hex::encode(self.public_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_sign_verify_roundtrip() {
        let kp = SigningKeypair::generate();
        let msg = b"hello out there";
        let sig = kp.sign(msg);
        assert!(verify_signature(&kp.public_bytes(), msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = SigningKeypair::generate();
        let sig = kp.sign(b"correct");
        assert!(!verify_signature(&kp.public_bytes(), b"tampered", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = SigningKeypair::generate();
        let kp2 = SigningKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!verify_signature(&kp2.public_bytes(), b"message", &sig));
    }

    #[test]
    fn truncated_signature_fails_cleanly() {
        let kp = SigningKeypair::generate();
        let sig = kp.sign(b"message");
        assert!(!verify_signature(&kp.public_bytes(), b"message", &sig[..40]));
    }

    #[test]
    fn signing_seed_roundtrip() {
        let kp = SigningKeypair::generate();
        let restored = SigningKeypair::from_seed(&kp.secret_bytes());
        assert_eq!(kp.public_bytes(), restored.public_bytes());
    }

    #[test]
    fn agreement_shared_secret_matches() {
        let alice = AgreementKeypair::generate();
        let bob = AgreementKeypair::generate();
        let s1 = alice.diffie_hellman(&bob.public_bytes());
        let s2 = bob.diffie_hellman(&alice.public_bytes());
        assert_eq!(s1, s2);
    }

    #[test]
    fn agreement_seed_roundtrip() {
        let kp = AgreementKeypair::generate();
        let restored = AgreementKeypair::from_seed(&kp.secret_bytes());
        assert_eq!(kp.public_bytes(), restored.public_bytes());
    }

    #[test]
    fn generated_keys_are_unlinkable() {
        // Two calls must never collide. If this fails the OS RNG is broken
        // and key generation is the least of your problems.
        let a = Keypair::generate(KeyRole::Authentication);
        let b = Keypair::generate(KeyRole::Authentication);
        assert_ne!(a.public_bytes(), b.public_bytes());

        let c = Keypair::generate(KeyRole::Agreement);
        let d = Keypair::generate(KeyRole::Agreement);
        assert_ne!(c.public_bytes(), d.public_bytes());
    }

    #[test]
    fn role_dispatch_picks_the_right_algorithm() {
        let auth = Keypair::generate(KeyRole::Authentication);
        assert_eq!(auth.role(), KeyRole::Authentication);
        // An authentication key must be a valid Ed25519 point.
        assert!(validate_verifying_key(&auth.public_bytes()).is_ok());

        let agreem = Keypair::generate(KeyRole::Agreement);
        assert_eq!(agreem.role(), KeyRole::Agreement);
    }

    #[test]
    fn debug_does_not_leak_secrets() {
        let kp = SigningKeypair::generate();
        let secret_hex = hex::encode(kp.secret_bytes());
        let debug_str = format!("{:?}", kp);
        assert!(!debug_str.contains(&secret_hex));

        let kp = AgreementKeypair::generate();
        let secret_hex = hex::encode(kp.secret_bytes());
        let debug_str = format!("{:?}", kp);
        assert!(!debug_str.contains(&secret_hex));
    }

    #[test]
    fn deterministic_signatures() {
        let kp = SigningKeypair::generate();
        assert_eq!(kp.sign(b"same input"), kp.sign(b"same input"));
    }
}
