/*!
Server public key container.

The server sends its RSA key as a DER SubjectPublicKeyInfo blob. Once the
operator accepts it the blob is wrapped into PEM text, and that text is the
only form kept; it is parsed into an RSA handle when the envelope is
encrypted.
*/

use crate::core::{
    constants::pem::{PUBLIC_KEY_FOOTER, PUBLIC_KEY_HEADER},
    encoding::{encode_base64, wrap_pem},
    error::{Error, Result},
};
use rsa::{RsaPublicKey, pkcs8::DecodePublicKey};
use std::fmt;

/// PEM key container for an accepted server public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyContainer {
    pem: String,
}

impl PublicKeyContainer {
    /// Wrap a raw DER key blob
    pub fn from_der(blob: &[u8]) -> Self {
        Self {
            pem: wrap_pem(&encode_base64(blob), PUBLIC_KEY_HEADER, PUBLIC_KEY_FOOTER),
        }
    }

    /// Use existing PEM text as-is
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self { pem: pem.into() }
    }

    /// PEM text
    pub fn as_pem(&self) -> &str {
        &self.pem
    }

    /// Parse into an RSA public key handle.
    pub fn parse(&self) -> Result<RsaPublicKey> {
        RsaPublicKey::from_public_key_pem(&self.pem).map_err(|e| Error::InvalidPublicKey(e.to_string()))
    }
}

impl fmt::Display for PublicKeyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pem)
    }
}
