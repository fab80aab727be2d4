//! AEAD encrypt/decrypt over the three QUIC-mandated ciphers.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey};

use crate::error::{Error, Result};
use crate::suite::{CipherSuite, IV_LEN, TAG_LEN};

fn bound_key(suite: CipherSuite, key: &[u8]) -> Result<LessSafeKey> {
    if key.len() != suite.key_len() {
        return Err(Error::InvalidKeyLength {
            want: suite.key_len(),
            got: key.len(),
        });
    }
    let unbound = UnboundKey::new(suite.aead_algorithm(), key)
        .map_err(|_| Error::InvalidKeyLength { want: suite.key_len(), got: key.len() })?;
    Ok(LessSafeKey::new(unbound))
}

/// `out.len()` must equal `plain.len() + 16`; ciphertext and tag are
/// concatenated in that order.
pub fn encrypt(
    suite: CipherSuite,
    key: &[u8],
    iv: &[u8; IV_LEN],
    aad: &[u8],
    plain: &[u8],
    out: &mut [u8],
) -> Result<()> {
    if out.len() != plain.len() + TAG_LEN {
        return Err(Error::InvalidBufferLength {
            want: plain.len() + TAG_LEN,
            got: out.len(),
        });
    }
    let key = bound_key(suite, key)?;
    let nonce = Nonce::assume_unique_for_key(*iv);
    out[..plain.len()].copy_from_slice(plain);
    let tag = key
        .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut out[..plain.len()])
        .map_err(|_| Error::AuthenticationFailed)?;
    out[plain.len()..].copy_from_slice(tag.as_ref());
    Ok(())
}

/// `input.len()` must be at least 16; the tag is the trailing 16 bytes.
/// `out.len()` must equal `input.len() - 16`. On authentication failure
/// `out` is left unmodified and [`Error::AuthenticationFailed`] is
/// returned.
pub fn decrypt(
    suite: CipherSuite,
    key: &[u8],
    iv: &[u8; IV_LEN],
    aad: &[u8],
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    if input.len() < TAG_LEN {
        return Err(Error::InvalidBufferLength {
            want: TAG_LEN,
            got: input.len(),
        });
    }
    let plain_len = input.len() - TAG_LEN;
    if out.len() != plain_len {
        return Err(Error::InvalidBufferLength {
            want: plain_len,
            got: out.len(),
        });
    }
    let key = bound_key(suite, key)?;
    let nonce = Nonce::assume_unique_for_key(*iv);
    let mut buf = input.to_vec();
    let plain = key
        .open_in_place(nonce, Aad::from(aad), &mut buf)
        .map_err(|_| Error::AuthenticationFailed)?;
    out.copy_from_slice(plain);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(suite: CipherSuite) {
        let key = vec![0x11u8; suite.key_len()];
        let iv = [0x22u8; IV_LEN];
        let aad = b"connection id";
        let plain = b"the quick brown fox jumps over the lazy dog";
        let mut ct = vec![0u8; plain.len() + TAG_LEN];
        encrypt(suite, &key, &iv, aad, plain, &mut ct).unwrap();

        let mut recovered = vec![0u8; plain.len()];
        decrypt(suite, &key, &iv, aad, &ct, &mut recovered).unwrap();
        assert_eq!(&recovered[..], &plain[..]);
    }

    #[test]
    fn roundtrip_all_suites() {
        roundtrip(CipherSuite::Aes128Gcm);
        roundtrip(CipherSuite::Aes256Gcm);
        roundtrip(CipherSuite::ChaCha20Poly1305);
    }

    #[test]
    fn flipped_tag_bit_fails_auth() {
        let suite = CipherSuite::Aes128Gcm;
        let key = vec![0x11u8; suite.key_len()];
        let iv = [0x22u8; IV_LEN];
        let aad = b"aad";
        let plain = b"hello world";
        let mut ct = vec![0u8; plain.len() + TAG_LEN];
        encrypt(suite, &key, &iv, aad, plain, &mut ct).unwrap();
        *ct.last_mut().unwrap() ^= 0x01;

        let mut out = vec![0u8; plain.len()];
        assert!(matches!(
            decrypt(suite, &key, &iv, aad, &ct, &mut out),
            Err(Error::AuthenticationFailed)
        ));
    }

    #[test]
    fn flipped_aad_bit_fails_auth() {
        let suite = CipherSuite::ChaCha20Poly1305;
        let key = vec![0x33u8; suite.key_len()];
        let iv = [0x44u8; IV_LEN];
        let plain = b"payload";
        let mut ct = vec![0u8; plain.len() + TAG_LEN];
        encrypt(suite, &key, &iv, b"aad-a", plain, &mut ct).unwrap();

        let mut out = vec![0u8; plain.len()];
        assert!(decrypt(suite, &key, &iv, b"aad-b", &ct, &mut out).is_err());
    }
}
