/*!
Session key material and the integrity-tagged envelope that carries it.

The bundle is `key || iv` for the configured cipher. The envelope appends
the configured digest of the bundle, and is what gets encrypted under the
server's RSA key with PKCS#1 v1.5 padding. Both types own their bytes in
zero-on-drop storage.
*/

use crate::core::{
    crypto::{
        config::{CryptoConfig, DigestAlgorithm, SymmetricCipher},
        digest::digest,
    },
    error::{Error, Result},
    memory::SecureVec,
    security::constant_time_eq,
};
use rand::{CryptoRng, RngCore};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// Symmetric key and IV for one connection
#[derive(Debug, Clone)]
pub struct SessionKeyBundle {
    cipher: SymmetricCipher,
    bytes: SecureVec,
}

impl SessionKeyBundle {
    /// Fill a new bundle from `rng`.
    ///
    /// There is no fallback source: if `rng` fails the result is
    /// [`Error::KeyGenerationFailed`].
    pub fn generate_with_rng<R: RngCore + CryptoRng>(cipher: SymmetricCipher, rng: &mut R) -> Result<Self> {
        let mut bytes = SecureVec::zeroed(cipher.key_size() + cipher.iv_size());
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;
        Ok(Self { cipher, bytes })
    }

    /// Rebuild a bundle from `key || iv` bytes.
    pub fn from_bytes(cipher: SymmetricCipher, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != cipher.key_size() + cipher.iv_size() {
            return Err(Error::Config(format!(
                "{} session key bundle must be {} bytes, got {}",
                cipher,
                cipher.key_size() + cipher.iv_size(),
                bytes.len()
            )));
        }
        Ok(Self {
            cipher,
            bytes: SecureVec::from_slice(bytes),
        })
    }

    /// Cipher the bundle is sized for
    pub fn cipher(&self) -> SymmetricCipher {
        self.cipher
    }

    /// Symmetric key
    pub fn key(&self) -> &[u8] {
        &self.bytes[..self.cipher.key_size()]
    }

    /// Initialization vector
    pub fn iv(&self) -> &[u8] {
        &self.bytes[self.cipher.key_size()..]
    }

    /// Raw `key || iv`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// `bundle || digest(bundle)`, in plaintext
#[derive(Debug)]
pub struct Envelope {
    bytes: SecureVec,
    bundle_len: usize,
}

impl Envelope {
    /// Build the envelope for `bundle`
    pub fn seal(bundle: &SessionKeyBundle, algorithm: DigestAlgorithm) -> Self {
        let tag = SecureVec::from_vec(digest(algorithm, bundle.as_bytes()));

        let mut bytes = SecureVec::from_vec(Vec::with_capacity(bundle.as_bytes().len() + tag.len()));
        bytes.extend_from_slice(bundle.as_bytes());
        bytes.extend_from_slice(&tag);

        Self {
            bytes,
            bundle_len: bundle.as_bytes().len(),
        }
    }

    /// Split a decrypted envelope and check its digest.
    ///
    /// Any length or digest mismatch is [`Error::TamperedEnvelope`].
    pub fn open(plaintext: &[u8], config: &CryptoConfig) -> Result<SessionKeyBundle> {
        if plaintext.len() != config.envelope_len() {
            return Err(Error::TamperedEnvelope);
        }

        let (bundle, received) = plaintext.split_at(config.bundle_len());
        let expected = SecureVec::from_vec(digest(config.digest, bundle));
        if !constant_time_eq(received, &expected) {
            return Err(Error::TamperedEnvelope);
        }

        SessionKeyBundle::from_bytes(config.cipher, bundle)
    }

    /// Bundle part
    pub fn bundle_bytes(&self) -> &[u8] {
        &self.bytes[..self.bundle_len]
    }

    /// Digest part
    pub fn digest(&self) -> &[u8] {
        &self.bytes[self.bundle_len..]
    }

    /// Whole plaintext envelope
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encrypt under `public_key` with randomized PKCS#1 v1.5 padding.
    ///
    /// Fails with [`Error::EncryptionFailed`] if the envelope does not fit
    /// the key's modulus.
    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(&self, public_key: &RsaPublicKey, rng: &mut R) -> Result<Vec<u8>> {
        public_key
            .encrypt(rng, Pkcs1v15Encrypt, &self.bytes)
            .map_err(|e| Error::EncryptionFailed(e.to_string()))
    }
}

/// Decrypt an encrypted envelope with the server's private key and verify it.
pub fn decrypt_envelope(private_key: &RsaPrivateKey, ciphertext: &[u8], config: &CryptoConfig) -> Result<SessionKeyBundle> {
    let plaintext = private_key
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .map(SecureVec::from_vec)
        .map_err(|_| Error::DecryptionFailed)?;

    Envelope::open(&plaintext, config)
}
