// Copyright (c) 2026 The didcomm-peer Authors. MIT License.
// See LICENSE for details.

//! # Messaging Envelope Engine
//!
//! Turns plaintext messages into encrypted envelopes and back, keyed
//! entirely by peer DIDs. Three protection levels compose freely:
//!
//! - **anoncrypt** — confidentiality only; the recipient learns nothing
//!   about who sent it.
//! - **authcrypt** — confidentiality plus sender authentication baked
//!   into the key agreement itself; by default the authenticated layer
//!   is wrapped in an anonymous outer layer so the wire leaks no sender
//!   identity either.
//! - **sign-then-encrypt** — a non-repudiable signature travels inside
//!   the ciphertext, orthogonal to the encryption sender.
//!
//! [`wire`] defines the serialized shapes, [`pack`] builds envelopes,
//! [`unpack`] opens and verifies them.

pub mod pack;
pub mod unpack;
pub mod wire;

pub use pack::{pack_encrypted, PackError, PackOptions};
pub use unpack::{unpack, UnpackError, UnpackMetadata, UnpackResult};
pub use wire::{Envelope, EnvelopeAlg, Message, SignedPayload};
