//! `SendData`, and the per-`SocketContext` FIFO that implements send
//! backpressure (spec §4.4.5).

use std::net::{IpAddr, SocketAddr};

use crate::error::{Error, Result};

/// A batch of up to `MaxBatchSize` buffers, each emitted as its own UDP
/// datagram to the same destination in one `sendmmsg` call, plus the
/// addressing it needs to retry after a partial send or an `EAGAIN`.
#[derive(Debug)]
pub struct SendData {
    pub buffers: Vec<Vec<u8>>,
    pub local: Option<IpAddr>,
    pub remote: SocketAddr,
    pub ecn: u8,
}

impl SendData {
    /// Rejects an empty batch or one over `max_batch_size` rather than
    /// silently truncating it — splitting an oversized submission is the
    /// caller's decision to make, not this constructor's.
    pub fn new(buffers: Vec<Vec<u8>>, remote: SocketAddr, ecn: u8, max_batch_size: usize) -> Result<Self> {
        if buffers.is_empty() || buffers.len() > max_batch_size {
            return Err(Error::BatchSize {
                len: buffers.len(),
                max: max_batch_size,
            });
        }
        Ok(Self {
            buffers,
            local: None,
            remote,
            ecn,
        })
    }

    /// Drop the buffers a partial `sendmmsg` already queued, leaving only
    /// the unsent remainder behind for the next retry.
    pub(crate) fn drop_sent(&mut self, sent: usize) {
        self.buffers.drain(..sent);
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
