/// Error taxonomy for the crypto layer. `AuthenticationFailed` is the
/// "distinct TLS error" spec §4.3 requires decrypt to surface on tag
/// mismatch — callers map it to the QUIC-TLS alert, not to a generic I/O
/// failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("AEAD authentication failed")]
    AuthenticationFailed,

    #[error("key length {got} is invalid for this cipher suite (want {want})")]
    InvalidKeyLength { want: usize, got: usize },

    #[error("output buffer length {got} does not match expected {want}")]
    InvalidBufferLength { want: usize, got: usize },

    #[error("HKDF expand-label failed")]
    Hkdf,

    #[error("header protection mask computation failed")]
    HeaderProtection,
}

pub type Result<T> = std::result::Result<T, Error>;
