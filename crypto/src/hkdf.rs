//! HKDF-Extract and TLS 1.3 expand-label, per RFC 5869 and RFC 8446 §7.1.

use ring::hkdf::{KeyType, Prk, Salt};

use crate::error::{Error, Result};
use crate::suite::HashAlgorithm;

/// `QUIC_HKDF_LABELS` prefix: TLS 1.3's on-the-wire labels are always
/// prefixed with this string before hashing.
const LABEL_PREFIX: &[u8] = b"tls13 ";

struct OutLen(usize);

impl KeyType for OutLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// `format-label(label, length)`: `u16 length | u8 (len(prefix+label)) |
/// "<prefix><label>" | u8 0` (empty context, which is all QUIC's HKDF uses
/// need).
fn format_label(label: &str, length: u16) -> Vec<u8> {
    let full_label_len = (LABEL_PREFIX.len() + label.len()) as u8;
    let mut info = Vec::with_capacity(2 + 1 + LABEL_PREFIX.len() + label.len() + 1);
    info.extend_from_slice(&length.to_be_bytes());
    info.push(full_label_len);
    info.extend_from_slice(LABEL_PREFIX);
    info.extend_from_slice(label.as_bytes());
    info.push(0);
    info
}

/// HKDF-Extract(salt, ikm) -> a pseudorandom key usable with
/// [`expand_label`].
pub fn extract(algorithm: HashAlgorithm, salt: &[u8], ikm: &[u8]) -> Prk {
    Salt::new(algorithm.hkdf_algorithm(), salt).extract(ikm)
}

/// Treat `secret` directly as an extracted key, for the common TLS 1.3
/// case where a traffic secret (itself already the output of an earlier
/// expand-label) becomes the input to the next one without a fresh
/// extract step.
pub fn prk_from_secret(algorithm: HashAlgorithm, secret: &[u8]) -> Prk {
    Prk::new_less_safe(algorithm.hkdf_algorithm(), secret)
}

/// HKDF-Expand-Label(prk, label, "", out.len()), writing `out.len()` bytes
/// into `out`.
pub fn expand_label(prk: &Prk, label: &str, out: &mut [u8]) -> Result<()> {
    let info = format_label(label, out.len() as u16);
    let info_refs = [info.as_slice()];
    let okm = prk
        .expand(&info_refs, OutLen(out.len()))
        .map_err(|_| Error::Hkdf)?;
    okm.fill(out).map_err(|_| Error::Hkdf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_encoding_matches_rfc_example() {
        let info = format_label("quic key", 16);
        assert_eq!(
            info,
            hex::decode("00100e746c7331332071756963206b657900").unwrap()
        );
    }

    #[test]
    fn expand_label_produces_requested_length() {
        let prk = prk_from_secret(HashAlgorithm::Sha256, &[0x42u8; 32]);
        let mut out = [0u8; 16];
        expand_label(&prk, "quic iv", &mut out[..12]).unwrap();
    }
}
