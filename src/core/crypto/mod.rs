/*!
Cryptographic components for the armorlink protocol.

This module provides the digest primitive, the keyed-hash message
authentication layer built on it, the server public key container and the
session key envelope.
*/

// Algorithm selection
pub mod config;

// Plain digest primitive
pub mod digest;

// Message authentication layer
pub mod hmac;

// Server public key handling
pub mod public_key;

// Session key bundle and envelope
pub mod session_key;

// Re-export frequently used types
pub use config::{CryptoConfig, DigestAlgorithm, SymmetricCipher};
pub use digest::{DigestContext, digest};
pub use hmac::{HmacLayer, MessageBuffer};
pub use public_key::PublicKeyContainer;
pub use session_key::{Envelope, SessionKeyBundle, decrypt_envelope};
