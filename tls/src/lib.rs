//! Security-configuration lifecycle and per-connection TLS session,
//! driven over a byte-level handshake transport (spec §4.5).

pub mod callbacks;
pub mod cert;
pub mod error;
pub mod handshake_buffer;
pub mod record;
pub mod sec_config;
pub mod session;
pub mod storage;
pub mod ticket;

pub use callbacks::TlsCallbacks;
pub use error::{Error, Result};
pub use sec_config::{CredentialConfig, SecConfig, TlsFlags};
pub use session::{NewKeys, ProcessResult, Tls};
pub use ticket::TicketKey;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct CapturingCallbacks {
        received_tp: Mutex<Vec<Vec<u8>>>,
    }

    impl TlsCallbacks for CapturingCallbacks {
        fn receive_tp(&self, buf: &[u8]) -> bool {
            self.received_tp.lock().unwrap().push(buf.to_vec());
            true
        }
        fn receive_ticket(&self, _buf: &[u8]) -> bool {
            true
        }
        fn certificate_received(&self, _chain: &[u8], _deferred_error: Option<&str>) -> bool {
            true
        }
    }

    fn self_signed_pem() -> (Vec<u8>, Vec<u8>) {
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let params = rcgen::CertificateParams::new(vec!["localhost".into()]).unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        (cert.pem().into_bytes(), key_pair.serialize_pem().into_bytes())
    }

    /// Drives a full client/server handshake entirely through
    /// `Tls::process_data`, feeding each side's handshake bytes straight
    /// into the other's `ProcessData` the way the QUIC core would feed
    /// CRYPTO-frame payloads — exercising record reassembly, the
    /// `rustls::quic` dispatch, and `ReceiveTP` delivery together.
    #[test]
    fn client_and_server_complete_a_handshake_over_process_data() {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let key_pair = rcgen::KeyPair::generate().unwrap();
        let params = rcgen::CertificateParams::new(vec!["localhost".into()]).unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        let cert_der = cert.der().clone();
        let cert_pem = cert.pem().into_bytes();
        let key_pem = key_pair.serialize_pem().into_bytes();

        let server_sec = SecConfig::create(
            CredentialConfig::CertChainAndKey { cert_chain_pem: cert_pem, key_pem },
            TlsFlags::SERVER,
            vec![b"h3".to_vec()],
            None,
        )
        .unwrap();

        let mut roots = rustls::RootCertStore::empty();
        roots.add(cert_der).unwrap();
        let client_sec = SecConfig::create(
            CredentialConfig::CertChainAndKey { cert_chain_pem: vec![], key_pem: vec![] },
            TlsFlags::NONE,
            vec![b"h3".to_vec()],
            Some(roots),
        )
        .unwrap();

        let server_callbacks = Arc::new(CapturingCallbacks { received_tp: Mutex::new(Vec::new()) });
        let client_callbacks = Arc::new(CapturingCallbacks { received_tp: Mutex::new(Vec::new()) });

        let mut server = Tls::initialize_server(server_sec, b"server-tp".to_vec(), server_callbacks.clone()).unwrap();
        let mut client =
            Tls::initialize_client(client_sec, "localhost", b"client-tp".to_vec(), client_callbacks.clone()).unwrap();

        let mut client_new_keys = Vec::new();
        let mut server_new_keys = Vec::new();

        let mut to_server = Vec::new();
        let first = client.process_data(&[]).unwrap();
        let mut to_client = first.handshake_bytes;
        client_new_keys.extend(first.new_keys);

        for _ in 0..8 {
            if !to_client.is_empty() {
                let result = client.process_data(&to_client).unwrap();
                to_server = result.handshake_bytes;
                client_new_keys.extend(result.new_keys);
                to_client = Vec::new();
            }
            if !to_server.is_empty() {
                let result = server.process_data(&to_server).unwrap();
                to_client = result.handshake_bytes;
                server_new_keys.extend(result.new_keys);
                to_server = Vec::new();
            }
            if client.is_handshake_complete() && server.is_handshake_complete() {
                break;
            }
        }

        assert!(client.is_handshake_complete());
        assert!(server.is_handshake_complete());
        assert_eq!(server_callbacks.received_tp.lock().unwrap().as_slice(), &[b"client-tp".to_vec()]);
        assert_eq!(client_callbacks.received_tp.lock().unwrap().as_slice(), &[b"server-tp".to_vec()]);

        // Both sides must have surfaced a Handshake-level and a 1-RTT-level
        // key transition (spec §3 ProcessState's ReadKey/WriteKey slots).
        let has_both_levels = |keys: &[session::NewKeys]| {
            let has_hs = keys.iter().any(|k| matches!(k, session::NewKeys::Handshake(_)));
            let has_1rtt = keys.iter().any(|k| matches!(k, session::NewKeys::OneRtt(_)));
            has_hs && has_1rtt
        };
        assert!(has_both_levels(&client_new_keys));
        assert!(has_both_levels(&server_new_keys));

        // Update(1-RTT key): once 1-RTT keys exist, both sides can roll to
        // the next generation independently of any further TLS record.
        client.update_one_rtt_keys().unwrap();
        server.update_one_rtt_keys().unwrap();
    }
}
