//! `SecConfig` lifecycle (spec §4.5.1): a share-counted TLS context built
//! once per listener/connector and handed to every `Tls` session it
//! configures.

use std::sync::Arc;

use rustls::{RootCertStore, ServerConfig};

use crate::error::{Error, Result};
use crate::ticket::TicketKey;

/// Mirrors spec's three credential kinds. `Pkcs12`/password-protected PEM
/// keys are intentionally out of scope here (Open Question, resolved in
/// DESIGN.md): no crate in this workspace's dependency stack parses
/// PKCS#12 or encrypted PKCS#8, and adding one for a single code path
/// would violate the "no fabricated dependencies" rule. The common
/// file+key case — which is also all the teacher's own certificate
/// loading (`wykurz-rcp/remote/src/tls.rs`) ever needed — is fully
/// implemented.
pub enum CredentialConfig {
    /// PEM-encoded certificate chain and unencrypted PEM private key,
    /// already read from disk by the caller.
    CertChainAndKey {
        cert_chain_pem: Vec<u8>,
        key_pem: Vec<u8>,
    },
    /// Password-protected key material (file+key+password, or a PKCS#12
    /// blob) — rejected with `InvalidParameter` at `SecConfig::create`.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlsFlags(u32);

impl TlsFlags {
    pub const NONE: Self = Self(0);
    pub const SERVER: Self = Self(1 << 0);
    pub const REQUIRE_CLIENT_AUTH: Self = Self(1 << 1);
    pub const DISABLE_RESUMPTION: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TlsFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Preference order fixed by spec §4.5.1: GCM-256, CHACHA20, GCM-128.
fn cipher_suite_preference() -> Vec<rustls::SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite::{
        TLS13_AES_128_GCM_SHA256, TLS13_AES_256_GCM_SHA384, TLS13_CHACHA20_POLY1305_SHA256,
    };
    vec![
        TLS13_AES_256_GCM_SHA384,
        TLS13_CHACHA20_POLY1305_SHA256,
        TLS13_AES_128_GCM_SHA256,
    ]
}

fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::CryptoProvider {
        cipher_suites: cipher_suite_preference(),
        ..rustls::crypto::ring::default_provider()
    })
}

fn load_cert_chain_and_key(
    cert_chain_pem: &[u8],
    key_pem: &[u8],
) -> Result<(Vec<rustls::pki_types::CertificateDer<'static>>, rustls::pki_types::PrivateKeyDer<'static>)> {
    let certs = rustls_pemfile::certs(&mut &cert_chain_pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::CredentialLoad(e.to_string()))?;
    if certs.is_empty() {
        return Err(Error::CredentialLoad("no certificates in PEM chain".into()));
    }
    let key = rustls_pemfile::private_key(&mut &key_pem[..])
        .map_err(|e| Error::CredentialLoad(e.to_string()))?
        .ok_or_else(|| Error::CredentialLoad("no private key in PEM file".into()))?;
    Ok((certs, key))
}

/// A share-counted TLS context. Every clone refers to the same
/// underlying `rustls` configs and ticket key, matching spec's
/// "owned by whoever completes the creation, then shared by every `TLS`"
/// lifetime (modeled with `Arc` rather than a hand-rolled refcount,
/// since nothing here needs the cyclic-back-pointer shape `crypto`'s
/// `PacketKey` avoids either).
#[derive(Clone)]
pub struct SecConfig {
    inner: Arc<SecConfigInner>,
}

struct SecConfigInner {
    server_config: Option<Arc<ServerConfig>>,
    client_config: Option<Arc<rustls::ClientConfig>>,
    flags: TlsFlags,
    ticket_key: std::sync::Mutex<Option<TicketKey>>,
}

impl SecConfig {
    /// `SecConfigCreate`. `root_store` is only consulted on the client
    /// path; servers present `cred`'s chain and do not need one unless
    /// `REQUIRE_CLIENT_AUTH` is set, in which case it doubles as the
    /// trust anchor for client certificates.
    pub fn create(
        cred: CredentialConfig,
        flags: TlsFlags,
        alpn_protocols: Vec<Vec<u8>>,
        root_store: Option<RootCertStore>,
    ) -> Result<Self> {
        let is_server = flags.contains(TlsFlags::SERVER);
        if !is_server && flags.contains(TlsFlags::REQUIRE_CLIENT_AUTH) {
            return Err(Error::InvalidParameter(
                "REQUIRE_CLIENT_AUTH is only meaningful for a server SecConfig",
            ));
        }

        let (cert_chain_pem, key_pem) = match cred {
            CredentialConfig::CertChainAndKey { cert_chain_pem, key_pem } => (cert_chain_pem, key_pem),
            CredentialConfig::Unsupported => {
                return Err(Error::InvalidParameter(
                    "password-protected / PKCS#12 credentials are not supported by this PAL build",
                ));
            }
        };

        let provider = crypto_provider();

        let (server_config, client_config) = if is_server {
            if cert_chain_pem.is_empty() {
                return Err(Error::InvalidParameter("a server SecConfig requires a certificate"));
            }
            let (certs, key) = load_cert_chain_and_key(&cert_chain_pem, &key_pem)?;

            let builder = ServerConfig::builder_with_provider(provider)
                .with_protocol_versions(&[&rustls::version::TLS13])
                .map_err(Error::Handshake)?;

            let mut config = if flags.contains(TlsFlags::REQUIRE_CLIENT_AUTH) {
                let roots = root_store
                    .ok_or(Error::InvalidParameter("REQUIRE_CLIENT_AUTH needs a root store"))?;
                let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
                    .build()
                    .map_err(|e| Error::CredentialLoad(e.to_string()))?;
                builder
                    .with_client_cert_verifier(verifier)
                    .with_single_cert(certs, key)
                    .map_err(Error::Handshake)?
            } else {
                builder
                    .with_no_client_auth()
                    .with_single_cert(certs, key)
                    .map_err(Error::Handshake)?
            };
            config.alpn_protocols = alpn_protocols;
            (Some(Arc::new(config)), None)
        } else {
            let roots = root_store.unwrap_or_else(rustls::RootCertStore::empty);
            let builder = rustls::ClientConfig::builder_with_provider(provider)
                .with_protocol_versions(&[&rustls::version::TLS13])
                .map_err(Error::Handshake)?
                .with_root_certificates(roots);
            let mut config = builder.with_no_client_auth();
            config.alpn_protocols = alpn_protocols;
            (None, Some(Arc::new(config)))
        };

        Ok(Self {
            inner: Arc::new(SecConfigInner {
                server_config,
                client_config,
                flags,
                ticket_key: std::sync::Mutex::new(None),
            }),
        })
    }

    pub fn is_server(&self) -> bool {
        self.inner.flags.contains(TlsFlags::SERVER)
    }

    pub fn resumption_disabled(&self) -> bool {
        self.inner.flags.contains(TlsFlags::DISABLE_RESUMPTION)
    }

    pub(crate) fn server_config(&self) -> Option<Arc<ServerConfig>> {
        self.inner.server_config.clone()
    }

    pub(crate) fn client_config(&self) -> Option<Arc<rustls::ClientConfig>> {
        self.inner.client_config.clone()
    }

    /// `SetTicketKeys`: only the first key in the list is used; server
    /// only. Spec names a 32-byte key + 16-byte id; `TicketKey` carries
    /// both.
    pub fn set_ticket_keys(&self, keys: &[TicketKey]) -> Result<()> {
        if !self.is_server() {
            return Err(Error::InvalidParameter("SetTicketKeys is server-only"));
        }
        let Some(first) = keys.first() else {
            return Ok(());
        };
        *self.inner.ticket_key.lock().unwrap() = Some(first.clone());
        Ok(())
    }

    pub(crate) fn ticket_key(&self) -> Option<TicketKey> {
        self.inner.ticket_key.lock().unwrap().clone()
    }
}
