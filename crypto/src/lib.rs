//! Crypto primitives the QUIC core needs, bound to a single provider
//! (`ring`): AEAD, header protection, hashing, HKDF, and packet-key
//! derivation/update/free.

pub mod aead;
pub mod error;
pub mod hash;
pub mod header_protection;
pub mod hkdf;
pub mod packet_key;
pub mod suite;

pub use error::{Error, Result};
pub use packet_key::{derive, initial, update, InitialKeys, PacketKey};
pub use suite::{CipherSuite, HashAlgorithm, IV_LEN, TAG_LEN};
