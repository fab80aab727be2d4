//! Cipher suite and hash algorithm identifiers, and their mapping onto
//! `ring`'s algorithm objects.

use ring::{aead, digest, hkdf};

/// Fixed AEAD tag length used throughout QUIC (`EncryptionOverhead`).
pub const TAG_LEN: usize = 16;

/// Nonce/IV length used throughout QUIC.
pub const IV_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn key_len(self) -> usize {
        match self {
            CipherSuite::Aes128Gcm => 16,
            CipherSuite::Aes256Gcm => 32,
            CipherSuite::ChaCha20Poly1305 => 32,
        }
    }

    /// Header-protection key length; the block cipher identity must agree
    /// with the AEAD, so this is always equal to `key_len`.
    pub fn hp_key_len(self) -> usize {
        self.key_len()
    }

    pub(crate) fn aead_algorithm(self) -> &'static aead::Algorithm {
        match self {
            CipherSuite::Aes128Gcm => &aead::AES_128_GCM,
            CipherSuite::Aes256Gcm => &aead::AES_256_GCM,
            CipherSuite::ChaCha20Poly1305 => &aead::CHACHA20_POLY1305,
        }
    }

    pub(crate) fn quic_hp_algorithm(self) -> &'static aead::quic::Algorithm {
        match self {
            CipherSuite::Aes128Gcm => &aead::quic::AES_128,
            CipherSuite::Aes256Gcm => &aead::quic::AES_256,
            CipherSuite::ChaCha20Poly1305 => &aead::quic::CHACHA20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    pub(crate) fn digest_algorithm(self) -> &'static digest::Algorithm {
        match self {
            HashAlgorithm::Sha256 => &digest::SHA256,
            HashAlgorithm::Sha384 => &digest::SHA384,
            HashAlgorithm::Sha512 => &digest::SHA512,
        }
    }

    pub(crate) fn hkdf_algorithm(self) -> hkdf::Algorithm {
        match self {
            HashAlgorithm::Sha256 => hkdf::HKDF_SHA256,
            HashAlgorithm::Sha384 => hkdf::HKDF_SHA384,
            HashAlgorithm::Sha512 => hkdf::HKDF_SHA512,
        }
    }

    pub(crate) fn hmac_algorithm(self) -> ring::hmac::Algorithm {
        match self {
            HashAlgorithm::Sha256 => ring::hmac::HMAC_SHA256,
            HashAlgorithm::Sha384 => ring::hmac::HMAC_SHA384,
            HashAlgorithm::Sha512 => ring::hmac::HMAC_SHA512,
        }
    }
}
