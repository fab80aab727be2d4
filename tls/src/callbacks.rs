//! The three TLS callbacks the QUIC core consumes (spec §4.5.3, §6),
//! modeled as a trait passed at session construction — the same shape as
//! `datapath::DatapathCallbacks`, so both dispatch tables share one idiom.

/// Dispatched from `Tls::process_data` on the thread that called it, per
/// spec §5 ("run on the PAL worker thread that detected the event").
pub trait TlsCallbacks: Send + Sync {
    /// Peer transport parameters arrived. Returning `false` aborts the
    /// handshake (malformed/rejected transport parameters).
    fn receive_tp(&self, buf: &[u8]) -> bool;

    /// A session ticket is available for the core to persist (client) or
    /// was handed new application data to seal into one (server).
    fn receive_ticket(&self, buf: &[u8]) -> bool;

    /// The peer's certificate chain has been received and (if
    /// `SecConfig` requested it) validated; `deferred_error` carries a
    /// validation failure the core may still choose to ignore.
    fn certificate_received(&self, chain: &[u8], deferred_error: Option<&str>) -> bool;
}
