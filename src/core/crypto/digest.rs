/*!
Plain digest primitive over the configured algorithm.
*/

use crate::core::crypto::config::DigestAlgorithm;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Incremental digest computation for a runtime-selected algorithm
#[derive(Clone)]
pub enum DigestContext {
    /// SHA-256 state
    Sha256(Sha256),
    /// SHA-384 state
    Sha384(Sha384),
    /// SHA-512 state
    Sha512(Sha512),
}

impl DigestContext {
    /// Start a fresh digest
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => DigestContext::Sha256(Sha256::new()),
            DigestAlgorithm::Sha384 => DigestContext::Sha384(Sha384::new()),
            DigestAlgorithm::Sha512 => DigestContext::Sha512(Sha512::new()),
        }
    }

    /// Algorithm of this context
    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            DigestContext::Sha256(_) => DigestAlgorithm::Sha256,
            DigestContext::Sha384(_) => DigestAlgorithm::Sha384,
            DigestContext::Sha512(_) => DigestAlgorithm::Sha512,
        }
    }

    /// Feed more input
    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestContext::Sha256(h) => h.update(data),
            DigestContext::Sha384(h) => h.update(data),
            DigestContext::Sha512(h) => h.update(data),
        }
    }

    /// Finish and write the digest into `out`, which must be exactly
    /// `output_size()` bytes long.
    pub(crate) fn finalize_into(self, out: &mut [u8]) {
        match self {
            DigestContext::Sha256(h) => out.copy_from_slice(&h.finalize()),
            DigestContext::Sha384(h) => out.copy_from_slice(&h.finalize()),
            DigestContext::Sha512(h) => out.copy_from_slice(&h.finalize()),
        }
    }

    /// Finish and return the digest
    pub fn finalize(self) -> Vec<u8> {
        match self {
            DigestContext::Sha256(h) => h.finalize().to_vec(),
            DigestContext::Sha384(h) => h.finalize().to_vec(),
            DigestContext::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// One-shot digest of `data`
pub fn digest(algorithm: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
    let mut ctx = DigestContext::new(algorithm);
    ctx.update(data);
    ctx.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let abc = digest(DigestAlgorithm::Sha256, b"abc");
        assert_eq!(
            abc[..4],
            [0xba, 0x78, 0x16, 0xbf],
        );

        let abc = digest(DigestAlgorithm::Sha512, b"abc");
        assert_eq!(abc[..4], [0xdd, 0xaf, 0x35, 0xa1]);
    }

    #[test]
    fn test_output_sizes_match_config() {
        for alg in [DigestAlgorithm::Sha256, DigestAlgorithm::Sha384, DigestAlgorithm::Sha512] {
            assert_eq!(digest(alg, b"").len(), alg.output_size());
            assert_eq!(DigestContext::new(alg).algorithm(), alg);
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut ctx = DigestContext::new(DigestAlgorithm::Sha384);
        ctx.update(b"hello ");
        ctx.update(b"world");
        let mut out = [0u8; 48];
        ctx.finalize_into(&mut out);
        assert_eq!(out.to_vec(), digest(DigestAlgorithm::Sha384, b"hello world"));
    }
}
