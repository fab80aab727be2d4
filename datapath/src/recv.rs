//! Receive buffers: fixed-size, pool-backed, one per in-flight datagram.

use std::net::{SocketAddr, SocketAddrV4};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use primitives::Pool;

/// Conservative MTU the fixed receive buffer is sized for.
pub const MTU: usize = 1500;
const MIN_IPV4_HEADER: usize = 20;
const UDP_HEADER: usize = 8;

/// Payload capacity of one receive buffer: MTU minus the smallest
/// possible IPv4 + UDP header, so a single buffer always holds one
/// datagram regardless of path MTU.
pub const RECV_PAYLOAD_LEN: usize = MTU - MIN_IPV4_HEADER - UDP_HEADER;

/// One received (or about-to-receive) datagram and its metadata, handed to
/// the core's `Receive` callback and returned via `ReturnRecv` when done.
pub struct RecvBlock {
    pub buffer: Vec<u8>,
    pub len: usize,
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub type_of_service: u8,
    pub partition_index: usize,
}

impl RecvBlock {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; RECV_PAYLOAD_LEN],
            len: 0,
            local: SocketAddr::V4(SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 0)),
            remote: SocketAddr::V4(SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 0)),
            type_of_service: 0,
            partition_index: 0,
        }
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.type_of_service = 0;
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

impl Default for RecvBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// A `RecvBlock` on loan from a pool. The core's equivalent of calling
/// `ReturnRecv` is simply dropping this guard — it returns the block to
/// the pool that issued it rather than requiring an explicit release call.
pub struct OwnedRecvBlock {
    block: Option<RecvBlock>,
    pool: Arc<Pool<RecvBlock>>,
}

impl OwnedRecvBlock {
    pub fn new(block: RecvBlock, pool: Arc<Pool<RecvBlock>>) -> Self {
        Self {
            block: Some(block),
            pool,
        }
    }
}

impl Deref for OwnedRecvBlock {
    type Target = RecvBlock;
    fn deref(&self) -> &RecvBlock {
        self.block.as_ref().expect("block taken before drop")
    }
}

impl DerefMut for OwnedRecvBlock {
    fn deref_mut(&mut self) -> &mut RecvBlock {
        self.block.as_mut().expect("block taken before drop")
    }
}

impl Drop for OwnedRecvBlock {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.put(block);
        }
    }
}

/// Build a pool of `RecvBlock`s, reset between uses.
pub fn new_pool() -> Pool<RecvBlock> {
    Pool::new(RecvBlock::new, RecvBlock::reset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_block_has_expected_capacity() {
        let block = RecvBlock::new();
        assert_eq!(block.buffer.len(), RECV_PAYLOAD_LEN);
        assert_eq!(block.payload().len(), 0);
    }

    #[test]
    fn reset_clears_length_and_tos() {
        let mut block = RecvBlock::new();
        block.len = 100;
        block.type_of_service = 0x2C;
        block.reset();
        assert_eq!(block.len, 0);
        assert_eq!(block.type_of_service, 0);
    }
}
