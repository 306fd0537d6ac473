// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Envelope Packing
//!
//! Builds encrypted (and optionally signed) envelopes from a plaintext
//! message and the recipient's DID. Pure request/response: resolve keys,
//! read secrets, emit bytes. The only side effects are secret store
//! *reads* — packing never writes anything anywhere.
//!
//! ## Construction, layer by layer
//!
//! 1. **Payload** — the message JSON; or, when a signer is given, a
//!    JWS-like wrapper over it (sign-then-encrypt, so the signature is
//!    confidential along with everything else).
//! 2. **Inner envelope** — anoncrypt when no sender is given, authcrypt
//!    when one is: the sender's static agreement secret participates in
//!    each recipient's KEK, which is what makes the encryption itself
//!    authenticate the sender.
//! 3. **Outer envelope** (only when hiding the sender) — the authcrypt
//!    envelope, skid and all, becomes the plaintext of a second
//!    anoncrypt envelope to the same recipients. A network observer sees
//!    an anonymous envelope; only a recipient gets far enough to learn
//!    who sent it.
//!
//! Every recipient agreement key in the resolved document gets its own
//! wrapped copy of the content key, in document order, so an envelope
//! can be opened by a party holding any one of them.

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{ALG_EDDSA, ENVELOPE_TYP};
use crate::crypto::encryption::{random_key, seal, seal_detached, EncryptionError};
use crate::crypto::kdf::{anoncrypt_kek, authcrypt_kek};
use crate::crypto::keys::{AgreementKeypair, KeyRole};
use crate::envelope::wire::{
    Envelope, EnvelopeAlg, EphemeralKey, Message, ProtectedHeader, Recipient, RecipientHeader,
    Signature, SignatureHeader, SignedPayload, WireError,
};
use crate::peer::did::DidError;
use crate::peer::document::resolve_keys_for_role;
use crate::peer::encoding::b64url_encode;
use crate::secrets::SecretStore;

/// Errors from envelope construction.
#[derive(Debug, Error)]
pub enum PackError {
    /// A required private key is not in the secret store.
    #[error("secret not found: {0}")]
    SecretNotFound(String),

    /// A DID involved in the pack failed to resolve.
    #[error(transparent)]
    Did(#[from] DidError),

    /// The recipient's document advertises no agreement keys, so there is
    /// nothing to encrypt to.
    #[error("recipient '{0}' has no agreement keys")]
    NoRecipientKeys(String),

    #[error("encryption failure: {0}")]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Knobs for [`pack_encrypted`] beyond the sender/recipient pair.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// DID whose authentication key signs the payload before encryption.
    /// Independent of the encryption sender — a message can be signed by
    /// one identity and encrypted from another, or signed but sent
    /// anonymously.
    pub sign_by: Option<String>,
    /// Encrypt the sender's key identifier instead of exposing it in the
    /// cleartext header. Only meaningful for authenticated envelopes; on
    /// by default.
    pub hide_sender: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            sign_by: None,
            hide_sender: true,
        }
    }
}

/// Encrypt `message` to every agreement key of `to`, optionally
/// authenticated as `from` and signed by `options.sign_by`. Returns the
/// serialized envelope.
pub fn pack_encrypted(
    secrets: &dyn SecretStore,
    message: &Message,
    to: &str,
    from: Option<&str>,
    options: &PackOptions,
) -> Result<String, PackError> {
    debug!(
        to = %to,
        authenticated = from.is_some(),
        signed = options.sign_by.is_some(),
        hide_sender = options.hide_sender,
        "packing envelope"
    );

    let recipient_keys = resolve_keys_for_role(to, KeyRole::Agreement)?;
    if recipient_keys.is_empty() {
        return Err(PackError::NoRecipientKeys(to.to_string()));
    }

    let message_bytes = serde_json::to_vec(message)
        .map_err(|e| WireError::Malformed(format!("message serialization: {e}")))?;

    let payload = match &options.sign_by {
        Some(signer) => sign_payload(secrets, &message_bytes, signer)?,
        None => message_bytes,
    };

    let envelope = match from {
        Some(sender) => {
            let (skid, sender_keypair) = sender_agreement_secret(secrets, sender)?;
            let inner = seal_envelope(
                EnvelopeAlg::Authcrypt,
                &payload,
                &recipient_keys,
                Some((&skid, &sender_keypair)),
                None,
            )?;
            if options.hide_sender {
                // The whole authcrypt envelope, skid included, becomes
                // the plaintext of an anonymous outer layer.
                let inner_json = inner.to_json()?;
                seal_envelope(
                    EnvelopeAlg::Anoncrypt,
                    inner_json.as_bytes(),
                    &recipient_keys,
                    None,
                    Some(ENVELOPE_TYP),
                )?
            } else {
                inner
            }
        }
        None => seal_envelope(EnvelopeAlg::Anoncrypt, &payload, &recipient_keys, None, None)?,
    };

    Ok(envelope.to_json()?)
}

/// Build one envelope layer: fresh ephemeral key, fresh CEK, one wrapped
/// CEK per recipient, payload sealed under the CEK with the protected
/// header as AAD.
pub(crate) fn seal_envelope(
    alg: EnvelopeAlg,
    plaintext: &[u8],
    recipient_keys: &[(String, [u8; 32])],
    sender: Option<(&str, &AgreementKeypair)>,
    cty: Option<&str>,
) -> Result<Envelope, PackError> {
    let ephemeral = AgreementKeypair::generate();
    let ephemeral_public = ephemeral.public_bytes();

    let mut header = ProtectedHeader::new(alg, EphemeralKey::from_bytes(&ephemeral_public));
    if let Some((skid, _)) = sender {
        header.skid = Some(skid.to_string());
    }
    header.cty = cty.map(str::to_string);
    let protected = header.encode()?;

    let cek = random_key();
    let mut recipients = Vec::with_capacity(recipient_keys.len());
    for (kid, recipient_public) in recipient_keys {
        let kek = match sender {
            None => {
                let ze = ephemeral.diffie_hellman(recipient_public);
                anoncrypt_kek(&ze, &ephemeral_public, recipient_public)
            }
            Some((_, sender_keypair)) => {
                let ze = ephemeral.diffie_hellman(recipient_public);
                let zs = sender_keypair.diffie_hellman(recipient_public);
                authcrypt_kek(
                    &ze,
                    &zs,
                    &ephemeral_public,
                    &sender_keypair.public_bytes(),
                    recipient_public,
                )
            }
        };
        trace!(kid = %kid, "wrapping content key for recipient");
        recipients.push(Recipient {
            header: RecipientHeader { kid: kid.clone() },
            encrypted_key: b64url_encode(&seal(&kek, &cek)?),
        });
    }

    let sealed = seal_detached(&cek, plaintext, protected.as_bytes())?;
    Ok(Envelope {
        protected,
        recipients,
        iv: b64url_encode(&sealed.nonce),
        ciphertext: b64url_encode(&sealed.ciphertext),
        tag: b64url_encode(&sealed.tag),
    })
}

/// Find an agreement key of `sender` whose private half is in the store.
///
/// The sender may advertise several agreement keys while the local store
/// holds only some of them; document order decides which one speaks for
/// the sender, mirroring the recipient-side scan order on unpack.
fn sender_agreement_secret(
    secrets: &dyn SecretStore,
    sender: &str,
) -> Result<(String, AgreementKeypair), PackError> {
    for (kid, _) in resolve_keys_for_role(sender, KeyRole::Agreement)? {
        if let Some(secret) = secrets.get(&kid) {
            if let Some(keypair) = secret.agreement_keypair() {
                return Ok((kid, keypair));
            }
        }
    }
    Err(PackError::SecretNotFound(format!(
        "no agreement secret for sender '{sender}'"
    )))
}

/// Sign the message bytes with an authentication key of `signer`,
/// producing the JWS-like wrapper that will be encrypted in place of the
/// bare message.
fn sign_payload(
    secrets: &dyn SecretStore,
    message_bytes: &[u8],
    signer: &str,
) -> Result<Vec<u8>, PackError> {
    let mut found = None;
    for (kid, _) in resolve_keys_for_role(signer, KeyRole::Authentication)? {
        if let Some(secret) = secrets.get(&kid) {
            if let Some(keypair) = secret.signing_keypair() {
                found = Some((kid, keypair));
                break;
            }
        }
    }
    let (kid, keypair) = found.ok_or_else(|| {
        PackError::SecretNotFound(format!("no authentication secret for signer '{signer}'"))
    })?;

    let signature = keypair.sign(message_bytes);
    let signature_header = SignatureHeader {
        alg: ALG_EDDSA.to_string(),
        kid,
    };
    let protected = b64url_encode(
        &serde_json::to_vec(&signature_header)
            .map_err(|e| WireError::Malformed(format!("signature header: {e}")))?,
    );

    let signed = SignedPayload {
        payload: b64url_encode(message_bytes),
        signatures: vec![Signature {
            protected,
            signature: b64url_encode(&signature),
        }],
    };
    serde_json::to_vec(&signed)
        .map_err(|e| PackError::Wire(WireError::Malformed(format!("signed payload: {e}"))))
}
