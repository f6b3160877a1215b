/*!
Zero-on-drop byte vector for key material.
*/

use std::fmt;
use std::ops::{Deref, DerefMut};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Owned byte buffer that is zeroed when dropped.
///
/// `Debug` output never shows the contents.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureVec {
    inner: Vec<u8>,
}

impl SecureVec {
    /// Create a zero-filled buffer of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        Self {
            inner: vec![0u8; len],
        }
    }

    /// Take ownership of an existing vector
    pub fn from_vec(inner: Vec<u8>) -> Self {
        Self { inner }
    }

    /// Copy a slice into a new buffer
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            inner: bytes.to_vec(),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Append bytes, wiping the old allocation if the vector has to grow
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        if self.inner.len() + bytes.len() > self.inner.capacity() {
            let mut grown = Vec::with_capacity(self.inner.len() + bytes.len());
            grown.extend_from_slice(&self.inner);
            self.inner.zeroize();
            self.inner = grown;
        }
        self.inner.extend_from_slice(bytes);
    }
}

impl Deref for SecureVec {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SecureVec {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl AsRef<[u8]> for SecureVec {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}

impl fmt::Debug for SecureVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureVec([REDACTED; {}])", self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecureVec::from_slice(&[0xAA; 8]);
        let shown = format!("{:?}", secret);
        assert_eq!(shown, "SecureVec([REDACTED; 8])");
        assert!(!shown.contains("170"));
    }

    #[test]
    fn test_extend_keeps_contents() {
        let mut secret = SecureVec::from_slice(b"abc");
        secret.extend_from_slice(b"defgh");
        assert_eq!(&secret[..], b"abcdefgh");
        assert_eq!(secret.len(), 8);
    }

    #[test]
    fn test_zeroize_clears() {
        let mut secret = SecureVec::from_slice(&[1, 2, 3]);
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
