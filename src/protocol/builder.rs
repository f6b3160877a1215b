/*!
Client configuration and builder.
*/

use crate::core::{
    constants::{PROTOCOL_VERSION, sizes::{MAX_PUBLIC_KEY_SIZE, MIN_PUBLIC_KEY_SIZE}},
    crypto::config::{CryptoConfig, DigestAlgorithm, SymmetricCipher},
    error::{Result, config_err},
};
use crate::protocol::client::sync_client::Client;
use std::time::Duration;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Settings for one client
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct ClientConfig {
    /// Version announced during the handshake
    pub protocol_version: i32,
    /// Digest and cipher selection
    pub crypto: CryptoConfig,
    /// Largest server public key accepted, in bytes
    pub max_public_key_size: usize,
    /// Read/write deadline applied to TCP connections. `None` blocks forever.
    pub io_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            crypto: CryptoConfig::default(),
            max_public_key_size: MAX_PUBLIC_KEY_SIZE,
            io_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PUBLIC_KEY_SIZE..=MAX_PUBLIC_KEY_SIZE).contains(&self.max_public_key_size) {
            return config_err(format!(
                "max public key size must be between {} and {} bytes, got {}",
                MIN_PUBLIC_KEY_SIZE, MAX_PUBLIC_KEY_SIZE, self.max_public_key_size
            ));
        }

        if self.io_timeout == Some(Duration::ZERO) {
            return config_err("I/O timeout must be greater than zero");
        }

        Ok(())
    }
}

/// Builder for [`Client`] instances
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a specific protocol version
    pub fn with_protocol_version(mut self, version: i32) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Use a specific digest algorithm
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.config.crypto.digest = digest;
        self
    }

    /// Use a specific symmetric cipher
    pub fn with_cipher(mut self, cipher: SymmetricCipher) -> Self {
        self.config.crypto.cipher = cipher;
        self
    }

    /// Replace the whole crypto configuration
    pub fn with_crypto_config(mut self, crypto: CryptoConfig) -> Self {
        self.config.crypto = crypto;
        self
    }

    /// Lower the public key size limit
    pub fn with_max_public_key_size(mut self, size: usize) -> Self {
        self.config.max_public_key_size = size;
        self
    }

    /// Apply a read/write deadline to TCP connections
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = Some(timeout);
        self
    }

    /// Validate and build the client
    pub fn build(self) -> Result<Client> {
        Client::with_config(self.config)
    }
}

/// Start building a client
pub fn client() -> ClientBuilder {
    ClientBuilder::new()
}
