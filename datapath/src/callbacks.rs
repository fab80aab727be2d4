//! The datapath's two callbacks to the QUIC core, modeled as a trait
//! passed at construction (spec §6, §9 "Deep callback registration") so
//! the same dispatch table is shared across every `SocketContext` without
//! per-call lookups.

use std::net::SocketAddr;

use crate::recv::OwnedRecvBlock;

pub trait DatapathCallbacks: Send + Sync {
    /// A datagram has arrived. Ownership of the block passes to the
    /// callee; it is returned to its pool when the `OwnedRecvBlock` guard
    /// drops.
    fn receive(&self, block: OwnedRecvBlock);

    /// The kernel reported the configured remote as unreachable
    /// (spec §4.4.6).
    fn unreachable(&self, remote: SocketAddr);
}
