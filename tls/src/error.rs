/// Error taxonomy for the TLS layer (spec §7, "TLS error" category).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid credential configuration: {0}")]
    InvalidParameter(&'static str),

    #[error("failed to load certificate/key material: {0}")]
    CredentialLoad(String),

    #[error("underlying TLS engine error: {0}")]
    Handshake(#[from] rustls::Error),

    #[error("peer sent a fatal alert: {0:?}")]
    Alert(rustls::AlertDescription),

    #[error("no signature scheme offered by the peer matches this certificate")]
    NoMatchingSignatureScheme,

    #[error("certificate chain verification failed: {0}")]
    ChainVerification(String),

    #[error("malformed certificate chain wire encoding")]
    MalformedChain,

    #[error("ticket seal/open failed")]
    TicketCrypto,

    #[error("session already uninitialized")]
    AlreadyUninitialized,
}

pub type Result<T> = std::result::Result<T, Error>;
