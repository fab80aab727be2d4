//! QUIC header-protection mask derivation: a 16-byte ciphertext sample in,
//! a 5-byte mask out, using the same block cipher identity as the AEAD in
//! use for the packet (`ring::aead::quic` already implements this per RFC
//! 9001 §5.4, so this module is a thin, typed wrapper rather than a second
//! implementation of the same stream-cipher sampling).

use ring::aead::quic::HeaderProtectionKey;

use crate::error::{Error, Result};
use crate::suite::CipherSuite;

pub fn mask(suite: CipherSuite, hp_key: &[u8], sample: &[u8; 16]) -> Result<[u8; 5]> {
    if hp_key.len() != suite.hp_key_len() {
        return Err(Error::InvalidKeyLength {
            want: suite.hp_key_len(),
            got: hp_key.len(),
        });
    }
    let key = HeaderProtectionKey::new(suite.quic_hp_algorithm(), hp_key)
        .map_err(|_| Error::HeaderProtection)?;
    key.new_mask(sample).map_err(|_| Error::HeaderProtection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_deterministic() {
        let key = vec![0xABu8; CipherSuite::Aes128Gcm.hp_key_len()];
        let sample = [0x5Cu8; 16];
        let m1 = mask(CipherSuite::Aes128Gcm, &key, &sample).unwrap();
        let m2 = mask(CipherSuite::Aes128Gcm, &key, &sample).unwrap();
        assert_eq!(m1, m2);
    }

    #[test]
    fn different_samples_give_different_masks() {
        let key = vec![0xABu8; CipherSuite::ChaCha20Poly1305.hp_key_len()];
        let m1 = mask(CipherSuite::ChaCha20Poly1305, &key, &[0u8; 16]).unwrap();
        let m2 = mask(CipherSuite::ChaCha20Poly1305, &key, &[1u8; 16]).unwrap();
        assert_ne!(m1, m2);
    }
}
