/*!
Cryptographic algorithm configuration for the armorlink protocol.

Both ends must agree on the digest and the symmetric cipher: the cipher
fixes the size of the session key bundle and the digest fixes the size of
the integrity tag appended to it, and of every authentication tag.
*/

use crate::core::{
    constants::sizes::aes,
    error::{Error, Result},
};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum DigestAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    #[default]
    Sha512,
}

impl DigestAlgorithm {
    /// Internal block size in bytes. The authentication master key and
    /// both pads have this length.
    pub fn block_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha512 => 128,
        }
    }

    /// Digest output size in bytes
    pub fn output_size(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::Config(format!("unknown digest algorithm '{}'", s))),
        }
    }
}

/// Supported symmetric ciphers for the session key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum SymmetricCipher {
    /// AES with a 128-bit key
    Aes128,
    /// AES with a 256-bit key
    #[default]
    Aes256,
}

impl SymmetricCipher {
    /// Key size in bytes
    pub fn key_size(self) -> usize {
        match self {
            SymmetricCipher::Aes128 => aes::KEY_SIZE_128,
            SymmetricCipher::Aes256 => aes::KEY_SIZE_256,
        }
    }

    /// Initialization vector size in bytes
    pub fn iv_size(self) -> usize {
        aes::IV_SIZE
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            SymmetricCipher::Aes128 => "aes128",
            SymmetricCipher::Aes256 => "aes256",
        }
    }
}

impl fmt::Display for SymmetricCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymmetricCipher {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "aes128" => Ok(SymmetricCipher::Aes128),
            "aes256" => Ok(SymmetricCipher::Aes256),
            _ => Err(Error::Config(format!("unknown cipher '{}'", s))),
        }
    }
}

/// Cryptographic configuration shared by both ends of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct CryptoConfig {
    /// Digest used for the envelope integrity tag and message authentication
    pub digest: DigestAlgorithm,
    /// Cipher whose key and IV make up the session key bundle
    pub cipher: SymmetricCipher,
}

impl CryptoConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new configuration with specific settings
    pub fn with_algorithms(digest: DigestAlgorithm, cipher: SymmetricCipher) -> Self {
        Self { digest, cipher }
    }

    /// Size of the plaintext session key bundle (key followed by IV)
    pub fn bundle_len(&self) -> usize {
        self.cipher.key_size() + self.cipher.iv_size()
    }

    /// Size of the plaintext envelope (bundle followed by its digest)
    pub fn envelope_len(&self) -> usize {
        self.bundle_len() + self.digest.output_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CryptoConfig::default();
        assert_eq!(config.digest, DigestAlgorithm::Sha512);
        assert_eq!(config.cipher, SymmetricCipher::Aes256);
        assert_eq!(config.bundle_len(), 48);
        assert_eq!(config.envelope_len(), 112);
    }

    #[test]
    fn test_sha256_aes256_envelope_is_80_bytes() {
        let config = CryptoConfig::with_algorithms(DigestAlgorithm::Sha256, SymmetricCipher::Aes256);
        assert_eq!(config.envelope_len(), 80);
    }

    #[test]
    fn test_digest_sizes() {
        assert_eq!(DigestAlgorithm::Sha256.block_size(), 64);
        assert_eq!(DigestAlgorithm::Sha384.block_size(), 128);
        assert_eq!(DigestAlgorithm::Sha512.block_size(), 128);
        assert_eq!(DigestAlgorithm::Sha384.output_size(), 48);
    }

    #[test]
    fn test_parse_names() -> Result<()> {
        assert_eq!("SHA-512".parse::<DigestAlgorithm>()?, DigestAlgorithm::Sha512);
        assert_eq!("sha256".parse::<DigestAlgorithm>()?, DigestAlgorithm::Sha256);
        assert_eq!("aes128".parse::<SymmetricCipher>()?, SymmetricCipher::Aes128);
        assert!("md5".parse::<DigestAlgorithm>().is_err());
        assert!("des".parse::<SymmetricCipher>().is_err());
        Ok(())
    }
}
