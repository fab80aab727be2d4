//! Plain digests and a salted (HMAC-keyed) hash object.

use ring::{digest, hmac};

use crate::suite::HashAlgorithm;

/// A one-shot digest over `data`.
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    digest::digest(algorithm.digest_algorithm(), data)
        .as_ref()
        .to_vec()
}

/// A hash object parameterised by a salt, reusable across many inputs —
/// the HMAC-as-hash-with-key shape the platform's `CXPLAT_HASH` exposes.
pub struct Hash {
    key: hmac::Key,
    algorithm: HashAlgorithm,
}

impl Hash {
    pub fn new(algorithm: HashAlgorithm, salt: &[u8]) -> Self {
        Self {
            key: hmac::Key::new(algorithm.hmac_algorithm(), salt),
            algorithm,
        }
    }

    pub fn output_len(&self) -> usize {
        self.algorithm.digest_len()
    }

    /// Compute the salted digest of `data` into `out`, which must be
    /// exactly [`Self::output_len`] bytes.
    pub fn compute(&self, data: &[u8], out: &mut [u8]) {
        assert_eq!(out.len(), self.output_len());
        let tag = hmac::sign(&self.key, data);
        out.copy_from_slice(tag.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_lengths_match_algorithm() {
        assert_eq!(digest(HashAlgorithm::Sha256, b"x").len(), 32);
        assert_eq!(digest(HashAlgorithm::Sha384, b"x").len(), 48);
        assert_eq!(digest(HashAlgorithm::Sha512, b"x").len(), 64);
    }

    #[test]
    fn salted_hash_is_deterministic_per_salt() {
        let h1 = Hash::new(HashAlgorithm::Sha256, b"salt-a");
        let h2 = Hash::new(HashAlgorithm::Sha256, b"salt-b");
        let mut out1 = [0u8; 32];
        let mut out2 = [0u8; 32];
        h1.compute(b"data", &mut out1);
        h2.compute(b"data", &mut out2);
        assert_ne!(out1, out2);
    }
}
