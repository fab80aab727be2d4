//! TLS session lifecycle and handshake transport (spec §4.5.2, §4.5.3).
//!
//! The six msquic-shaped callbacks spec §4.5.3 names
//! (`CryptoSend`/`CryptoRecvRecord`/`CryptoReleaseRecord`/`YieldSecret`/
//! `GotTransportParams`/`Alert`) existed to drive an OpenSSL-style,
//! TLS-record-framed engine from outside. `rustls::quic::Connection`
//! already speaks the QUIC-native contract those callbacks exist to
//! approximate — raw handshake-message bytes in (`read_hs`), raw
//! handshake bytes and `KeyChange` events out (`write_hs`) — so this
//! module keeps the *operations* (feed bytes in, get bytes + key
//! transitions + transport-parameter/alert signals out) and realizes
//! each one directly against `rustls::quic`, with `record::RecordList`
//! still doing the literal message-boundary reassembly spec §4.5.4
//! requires before anything reaches the engine.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::quic::{self, Connection as QuicConnection, KeyChange, Version};

use crate::callbacks::TlsCallbacks;
use crate::error::{Error, Result};
use crate::handshake_buffer::HandshakeBuffer;
use crate::record::RecordList;
use crate::sec_config::SecConfig;

/// A level transition's `ReadKey`/`WriteKey` pair (spec §3 `ProcessState`),
/// exactly as rustls derived it: `quic::Keys` bundles the opaque,
/// ready-to-use `PacketKey`/`HeaderProtectionKey` trait objects for both
/// directions. These trait objects, not raw secret bytes, are what
/// rustls's QUIC support hands out — see `apply_key_change` below for why
/// that rules out re-deriving them through `crypto::packet_key`.
pub enum NewKeys {
    Handshake(quic::Keys),
    OneRtt(quic::Keys),
}

/// Result of one `process_data` call: handshake bytes the core must
/// queue into an outgoing CRYPTO frame, any key-level transitions that
/// occurred while producing them, and whether the handshake just
/// completed on this call.
pub struct ProcessResult {
    pub handshake_bytes: Vec<u8>,
    pub handshake_just_completed: bool,
    pub new_keys: Vec<NewKeys>,
}

pub struct Tls {
    conn: QuicConnection,
    sec_config: SecConfig,
    callbacks: Arc<dyn TlsCallbacks>,
    records: RecordList,
    send_buffer: HandshakeBuffer,
    handshake_complete: bool,
    peer_tp_delivered: bool,
    alert: Option<rustls::AlertDescription>,
    /// The next 1-RTT generation's secrets, held so `update_one_rtt_keys`
    /// can roll forward without re-deriving anything this crate's own
    /// `crypto` provider doesn't have access to (rustls never exposes the
    /// raw traffic secret behind a `quic::Keys`).
    next_1rtt_secrets: Option<quic::Secrets>,
}

impl Tls {
    /// `TlsInitialize` (client path): copies in the SNI, sets ALPN via
    /// the SecConfig's `ClientConfig`, and stores local transport
    /// parameters via the TLS-extension mechanism (`rustls::quic`'s
    /// `params` argument).
    pub fn initialize_client(
        sec_config: SecConfig,
        server_name: &str,
        local_transport_params: Vec<u8>,
        callbacks: Arc<dyn TlsCallbacks>,
    ) -> Result<Self> {
        let config = sec_config
            .client_config()
            .ok_or(Error::InvalidParameter("SecConfig was not created for a client"))?;
        let name = ServerName::try_from(server_name.to_string())
            .map_err(|_| Error::InvalidParameter("invalid server name"))?;
        let conn = quic::ClientConnection::new(config, Version::V1, name, local_transport_params)
            .map_err(Error::Handshake)?;
        Ok(Self::new(QuicConnection::Client(conn), sec_config, callbacks))
    }

    /// `TlsInitialize` (server path).
    pub fn initialize_server(
        sec_config: SecConfig,
        local_transport_params: Vec<u8>,
        callbacks: Arc<dyn TlsCallbacks>,
    ) -> Result<Self> {
        let config = sec_config
            .server_config()
            .ok_or(Error::InvalidParameter("SecConfig was not created for a server"))?;
        let conn = quic::ServerConnection::new(config, Version::V1, local_transport_params).map_err(Error::Handshake)?;
        Ok(Self::new(QuicConnection::Server(conn), sec_config, callbacks))
    }

    fn new(conn: QuicConnection, sec_config: SecConfig, callbacks: Arc<dyn TlsCallbacks>) -> Self {
        Self {
            conn,
            sec_config,
            callbacks,
            records: RecordList::new(),
            send_buffer: HandshakeBuffer::new(),
            handshake_complete: false,
            peer_tp_delivered: false,
            alert: None,
            next_1rtt_secrets: None,
        }
    }

    /// `ProcessData`: feed CRYPTO-frame payload bytes, drive the engine
    /// forward, and report what it produced.
    pub fn process_data(&mut self, handshake_bytes: &[u8]) -> Result<ProcessResult> {
        self.records.push(handshake_bytes);

        while let Some(record) = self.records.peek().cloned() {
            if let Err(e) = self.conn.read_hs(&record.0) {
                self.record_alert();
                return Err(Error::Handshake(e));
            }
            self.records.release();
        }

        if let Some(alert) = self.conn.alert() {
            self.alert = Some(alert);
            return Err(Error::Alert(alert));
        }

        let mut produced = Vec::new();
        let mut new_keys = Vec::new();
        loop {
            let mut chunk = Vec::new();
            let key_change = self.conn.write_hs(&mut chunk);
            let done = chunk.is_empty() && key_change.is_none();

            if !chunk.is_empty() {
                if !self.send_buffer.append(&chunk) {
                    return Err(Error::Handshake(rustls::Error::General(
                        "handshake buffer exceeded hard cap".into(),
                    )));
                }
                produced.extend_from_slice(&chunk);
            }
            if let Some(change) = key_change {
                new_keys.push(self.apply_key_change(change));
            }
            if done {
                break;
            }
        }

        self.maybe_deliver_transport_params()?;

        let just_completed = !self.handshake_complete && !self.conn.is_handshaking();
        if just_completed {
            self.handshake_complete = true;
        }

        Ok(ProcessResult {
            handshake_bytes: produced,
            handshake_just_completed: just_completed,
            new_keys,
        })
    }

    fn record_alert(&mut self) {
        if let Some(alert) = self.conn.alert() {
            self.alert = Some(alert);
        }
    }

    /// `YieldSecret` equivalent. `rustls::quic::KeyChange` carries the
    /// derived `PacketKey`/`HeaderProtectionKey` pair for the level that
    /// just became available as opaque trait objects — rustls (like
    /// every production rustls/QUIC integration; see
    /// `aws-s2n-quic`'s own rustls session, which wraps these same
    /// `quic::Keys`/`quic::Secrets` types directly rather than piping them
    /// through its own crypto crate) never exposes the raw traffic secret
    /// behind them, so there is no byte sequence for `crypto::packet_key`
    /// to re-derive from. Surfacing `quic::Keys` as-is IS this PAL's
    /// `ReadKey`/`WriteKey` slots for the level; the buffer-offset
    /// bookkeeping spec's `CryptoSend` describes is the only bookkeeping
    /// left for this module to own.
    fn apply_key_change(&mut self, change: KeyChange) -> NewKeys {
        match change {
            KeyChange::Handshake { keys } => {
                self.send_buffer.mark_handshake_level();
                NewKeys::Handshake(keys)
            }
            KeyChange::OneRtt { keys, next } => {
                self.send_buffer.mark_1rtt_level();
                self.next_1rtt_secrets = Some(next);
                NewKeys::OneRtt(keys)
            }
        }
    }

    /// `Update(1-RTT key)`: rotate to the next 1-RTT generation. Mirrors
    /// `crypto::packet_key::update`'s "quic ku" derivation, but performed
    /// by the engine that already holds the secret and its
    /// confidentiality-limit usage count — calling `next_packet_keys`
    /// keeps exactly one copy of that state instead of forking a second,
    /// disconnected one in this crate.
    pub fn update_one_rtt_keys(&mut self) -> Result<quic::PacketKeySet> {
        self.next_1rtt_secrets
            .as_mut()
            .map(|secrets| secrets.next_packet_keys())
            .ok_or(Error::InvalidParameter("1-RTT keys are not established yet"))
    }

    /// `GotTransportParams`: client invokes `ReceiveTP` as soon as the
    /// peer's transport parameters are parsed; for a server they were
    /// already consumed at ClientHello, so this only ever fires once,
    /// on whichever side is waiting for them.
    fn maybe_deliver_transport_params(&mut self) -> Result<()> {
        if self.peer_tp_delivered {
            return Ok(());
        }
        if let Some(tp) = self.conn.quic_transport_parameters() {
            self.peer_tp_delivered = true;
            if !self.callbacks.receive_tp(tp) {
                return Err(Error::Handshake(rustls::Error::General(
                    "core rejected peer transport parameters".into(),
                )));
            }
        }
        Ok(())
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.handshake_complete
    }

    pub fn alert(&self) -> Option<rustls::AlertDescription> {
        self.alert
    }

    /// Server path of spec §4.5.5: seal ticket application data under
    /// the SecConfig's ticket key for the core to carry to the peer.
    pub fn seal_ticket(&self, app_data: &[u8]) -> Result<Vec<u8>> {
        let key = self.sec_config.ticket_key().ok_or(Error::TicketCrypto)?;
        key.seal(app_data)
    }

    /// Client path: a ticket opaque blob arrived; hand it to the core.
    pub fn deliver_ticket(&self, opaque: &[u8]) -> bool {
        self.callbacks.receive_ticket(opaque)
    }

    /// Uninitialize: drop owned buffers. Nothing beyond ordinary `Drop`
    /// is required — every owned buffer here (`records`, `send_buffer`,
    /// the SNI/ALPN copies inside `rustls`) is a plain Rust value, not a
    /// handle needing an explicit free.
    pub fn uninitialize(self) {}
}
