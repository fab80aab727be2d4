//! Certificate selection, signing, verification, chain validation, and
//! wire-format (de)serialization (spec §4.5.6).

use rustls::pki_types::{CertificateDer, TrustAnchor, UnixTime};
use rustls::sign::CertifiedKey;
use rustls::SignatureScheme;
use webpki::ring as webpki_ring;
use webpki::{EndEntityCert, KeyUsage};

use crate::error::{Error, Result};

/// **Select(cert, sigAlgs[])**: the first scheme `cert`'s key can use
/// that also appears in `offered`, per a fixed preference table that is
/// `rustls::sign::SigningKey::choose_scheme`'s own contract — the exact
/// "fixed table keyed by the cert's own SignatureAlgorithm OID" spec
/// describes, since `rustls` builds that table from the key's algorithm
/// identifier at `CertifiedKey` construction time.
pub fn select(cert: &CertifiedKey, offered: &[SignatureScheme]) -> Result<Box<dyn rustls::sign::Signer>> {
    cert.key.choose_scheme(offered).ok_or(Error::NoMatchingSignatureScheme)
}

/// **Sign(privKey, scheme, tbs, &sig)**: hashing + signing is one
/// operation in `rustls::sign::Signer` (it picks PKCS#1/PSS/raw-ECDSA
/// padding from the scheme the `Signer` was chosen for); the hash
/// buffer it allocates internally is `ring`'s, which already zeroes
/// digest state on drop, so no separate scrub step is needed here.
pub fn sign(signer: &dyn rustls::sign::Signer, tbs: &[u8]) -> Result<Vec<u8>> {
    signer.sign(tbs).map_err(Error::Handshake)
}

fn verification_algorithm(scheme: SignatureScheme) -> Option<&'static dyn webpki::types::SignatureVerificationAlgorithm> {
    use SignatureScheme::*;
    Some(match scheme {
        RSA_PKCS1_SHA256 => webpki_ring::RSA_PKCS1_2048_8192_SHA256,
        RSA_PKCS1_SHA384 => webpki_ring::RSA_PKCS1_2048_8192_SHA384,
        RSA_PKCS1_SHA512 => webpki_ring::RSA_PKCS1_2048_8192_SHA512,
        ECDSA_NISTP256_SHA256 => webpki_ring::ECDSA_P256_SHA256,
        ECDSA_NISTP384_SHA384 => webpki_ring::ECDSA_P384_SHA384,
        ED25519 => webpki_ring::ED25519,
        RSA_PSS_SHA256 => webpki_ring::RSA_PSS_2048_8192_SHA256_LEGACY_KEY,
        RSA_PSS_SHA384 => webpki_ring::RSA_PSS_2048_8192_SHA384_LEGACY_KEY,
        RSA_PSS_SHA512 => webpki_ring::RSA_PSS_2048_8192_SHA512_LEGACY_KEY,
        RSA_PKCS1_SHA1 => webpki_ring::RSA_PKCS1_2048_8192_SHA1,
        ECDSA_NISTP521_SHA512 => webpki_ring::ECDSA_P521_SHA512,
        _ => return None,
    })
}

/// **Verify(cert, scheme, tbs, sig)**: symmetric to `sign` — parse the
/// cert's SPKI and verify with the matching `webpki` algorithm object,
/// the "platform API matching the scheme" spec calls for.
pub fn verify(cert_der: &CertificateDer<'_>, scheme: SignatureScheme, tbs: &[u8], sig: &[u8]) -> Result<()> {
    let alg = verification_algorithm(scheme).ok_or(Error::NoMatchingSignatureScheme)?;
    let end_entity = EndEntityCert::try_from(cert_der).map_err(|e| Error::ChainVerification(format!("{e:?}")))?;
    end_entity
        .verify_signature(alg, tbs, sig)
        .map_err(|e| Error::ChainVerification(format!("{e:?}")))
}

/// **ValidateChain(cert, host?, ignoreFlags)**: verify `chain[0]` for
/// TLS server-auth usage against `roots`, optionally checking `host`.
/// `ignoreFlags` collapses to a single "skip hostname check" bit since
/// that is the only ignore-flag this PAL's callers ever need (matching
/// `wykurz-rcp`'s own "we trust by fingerprint, not by chain" stance —
/// here expressed as an explicit opt-out rather than a silent one).
pub fn validate_chain(
    chain: &[CertificateDer<'_>],
    host: Option<&str>,
    roots: &[TrustAnchor<'_>],
    skip_hostname_check: bool,
) -> bool {
    let Some((end_entity_der, intermediates)) = chain.split_first() else {
        return false;
    };
    let Ok(end_entity) = EndEntityCert::try_from(end_entity_der) else {
        return false;
    };
    let now = UnixTime::now();
    let verified = end_entity
        .verify_for_usage(
            webpki::ALL_VERIFICATION_ALGS,
            roots,
            intermediates,
            now,
            KeyUsage::server_auth(),
            None,
            None,
        )
        .is_ok();
    if !verified {
        return false;
    }
    if skip_hostname_check {
        return true;
    }
    match host.and_then(|h| webpki::types::ServerName::try_from(h).ok()) {
        Some(server_name) => end_entity.verify_is_valid_for_subject_name(&server_name).is_ok(),
        None => false,
    }
}

/// **FormatChain**: `<seq of: u24 length | DER bytes>`; an empty chain
/// is a single `u24 0` (spec §6, bit-exact wire format).
pub fn format_chain(chain: &[CertificateDer<'_>]) -> Vec<u8> {
    if chain.is_empty() {
        return vec![0, 0, 0];
    }
    let mut out = Vec::new();
    for cert in chain {
        let der = cert.as_ref();
        let len = der.len() as u32;
        out.extend_from_slice(&len.to_be_bytes()[1..]);
        out.extend_from_slice(der);
    }
    out
}

/// **ParseChain**: the inverse of `format_chain`.
pub fn parse_chain(mut wire: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut chain = Vec::new();
    loop {
        if wire.len() < 3 {
            return Err(Error::MalformedChain);
        }
        let len = u32::from_be_bytes([0, wire[0], wire[1], wire[2]]) as usize;
        wire = &wire[3..];
        if len == 0 && chain.is_empty() && wire.is_empty() {
            return Ok(chain);
        }
        if wire.len() < len {
            return Err(Error::MalformedChain);
        }
        chain.push(CertificateDer::from(wire[..len].to_vec()));
        wire = &wire[len..];
        if wire.is_empty() {
            return Ok(chain);
        }
    }
}
