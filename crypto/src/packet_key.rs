//! Packet-key derivation and update: `Initial`, `Derive`, `Update`.

use zeroize::Zeroize;

use crate::error::Result;
use crate::hkdf;
use crate::suite::{CipherSuite, HashAlgorithm, IV_LEN};

/// A derived QUIC packet key: AEAD key, IV, and header-protection key,
/// plus the traffic secret they came from (needed for a later `Update`).
/// Key material is zeroed on drop.
pub struct PacketKey {
    pub suite: CipherSuite,
    hash: HashAlgorithm,
    pub key: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub hp: Vec<u8>,
    traffic_secret: Vec<u8>,
}

impl Drop for PacketKey {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
        self.hp.zeroize();
        self.traffic_secret.zeroize();
    }
}

fn derive_from_secret(suite: CipherSuite, hash: HashAlgorithm, secret: &[u8]) -> Result<PacketKey> {
    let prk = hkdf::prk_from_secret(hash, secret);
    let mut key = vec![0u8; suite.key_len()];
    hkdf::expand_label(&prk, "quic key", &mut key)?;
    let mut iv = [0u8; IV_LEN];
    hkdf::expand_label(&prk, "quic iv", &mut iv)?;
    let mut hp = vec![0u8; suite.hp_key_len()];
    hkdf::expand_label(&prk, "quic hp", &mut hp)?;
    Ok(PacketKey {
        suite,
        hash,
        key,
        iv,
        hp,
        traffic_secret: secret.to_vec(),
    })
}

/// The two directional Initial keys derived from a version's initial salt
/// and the client's chosen connection ID. Always AES-128-GCM / SHA-256,
/// per RFC 9001 regardless of what the handshake later negotiates.
pub struct InitialKeys {
    pub client: PacketKey,
    pub server: PacketKey,
}

impl InitialKeys {
    /// `(read, write)` for the given role.
    pub fn for_role(self, is_server: bool) -> (PacketKey, PacketKey) {
        if is_server {
            (self.client, self.server)
        } else {
            (self.server, self.client)
        }
    }
}

/// `Initial(salt, cid)`: HKDF-Extract(salt, cid), then expand-label into
/// the client and server initial secrets, then into key/iv/hp for each.
pub fn initial(salt: &[u8], cid: &[u8]) -> Result<InitialKeys> {
    let initial_secret = hkdf::extract(HashAlgorithm::Sha256, salt, cid);

    let mut client_secret = [0u8; 32];
    hkdf::expand_label(&initial_secret, "client in", &mut client_secret)?;
    let mut server_secret = [0u8; 32];
    hkdf::expand_label(&initial_secret, "server in", &mut server_secret)?;

    let client = derive_from_secret(CipherSuite::Aes128Gcm, HashAlgorithm::Sha256, &client_secret)?;
    let server = derive_from_secret(CipherSuite::Aes128Gcm, HashAlgorithm::Sha256, &server_secret)?;
    Ok(InitialKeys { client, server })
}

/// `Derive(suite, hash, secret)`: Handshake/1-RTT/0-RTT keys from a
/// TLS-supplied traffic secret, using the negotiated cipher suite and hash.
pub fn derive(suite: CipherSuite, hash: HashAlgorithm, secret: &[u8]) -> Result<PacketKey> {
    derive_from_secret(suite, hash, secret)
}

/// `Update(oldKey)`: rotate a 1-RTT key by expanding the stored traffic
/// secret with the `quic ku` label, then re-deriving key and IV from the
/// new secret. The header-protection key is never rotated.
pub fn update(old: &PacketKey) -> Result<PacketKey> {
    let prk = hkdf::prk_from_secret(old.hash, &old.traffic_secret);
    let mut new_secret = vec![0u8; old.hash.digest_len()];
    hkdf::expand_label(&prk, "quic ku", &mut new_secret)?;
    let mut new_key = derive_from_secret(old.suite, old.hash, &new_secret)?;
    new_key.hp.copy_from_slice(&old.hp);
    Ok(new_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 9001 §A.1 / spec §8 scenario 1: the client-initial header
    /// protection key's first 4 bytes for this salt/cid pair.
    #[test]
    fn rfc9001_initial_key_test_vector() {
        let salt = hex::decode("38762cf7f55934b34d179ae6a4c80cadccbb7f0a").unwrap();
        let cid = hex::decode("8394c8f03e515708").unwrap();
        let keys = initial(&salt, &cid).unwrap();
        assert_eq!(&keys.client.hp[..4], &hex::decode("9f50449e").unwrap()[..]);
    }

    #[test]
    fn update_rotates_key_and_iv_but_not_hp() {
        let salt = hex::decode("38762cf7f55934b34d179ae6a4c80cadccbb7f0a").unwrap();
        let cid = hex::decode("8394c8f03e515708").unwrap();
        let keys = initial(&salt, &cid).unwrap();
        let hp_before = keys.client.hp.clone();
        let key_before = keys.client.key.clone();
        let updated = update(&keys.client).unwrap();
        assert_eq!(updated.hp, hp_before);
        assert_ne!(updated.key, key_before);
    }

    #[test]
    fn update_matches_direct_expand_label_of_quic_ku() {
        let suite = CipherSuite::Aes128Gcm;
        let hash = HashAlgorithm::Sha256;
        let secret = [0x7Au8; 32];
        let base = derive_from_secret(suite, hash, &secret).unwrap();
        let updated = update(&base).unwrap();

        let prk = hkdf::prk_from_secret(hash, &secret);
        let mut expected_secret = [0u8; 32];
        hkdf::expand_label(&prk, "quic ku", &mut expected_secret).unwrap();
        let expected = derive_from_secret(suite, hash, &expected_secret).unwrap();
        assert_eq!(updated.key, expected.key);
        assert_eq!(updated.iv, expected.iv);
    }
}
