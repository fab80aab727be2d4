//! `Datapath`: owns N `ProcessorContext`s and is the factory for `Socket`s
//! (spec §4.4.1).

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::callbacks::DatapathCallbacks;
use crate::error::Result;
use crate::processor::ProcessorContext;
use crate::socket_handle::Socket;

/// `QUIC_MAX_BATCH_SEND` on the teacher datapath's own Linux backend is 1
/// (`original_source/src/platform/datapath_linux.c`): this PAL drives one
/// `sendmmsg` per `SendData` rather than GSO segmentation, so a batch of 1
/// is the sensible default when a caller has no reason to want more.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1;

pub struct Datapath {
    processors: Vec<ProcessorContext>,
    callbacks: Arc<dyn DatapathCallbacks>,
    max_batch_size: usize,
}

impl Datapath {
    pub fn new(
        processor_count: NonZeroUsize,
        max_batch_size: NonZeroUsize,
        callbacks: Arc<dyn DatapathCallbacks>,
    ) -> std::io::Result<Self> {
        let mut processors = Vec::with_capacity(processor_count.get());
        for index in 0..processor_count.get() {
            processors.push(ProcessorContext::new(index)?);
        }
        Ok(Self {
            processors,
            callbacks,
            max_batch_size: max_batch_size.get(),
        })
    }

    /// Default to the host's notion of parallelism, per spec §4.4.1
    /// ("typically one per logical CPU; the design permits N=1"), and to
    /// [`DEFAULT_MAX_BATCH_SIZE`] for the send batch cap.
    pub fn with_default_parallelism(callbacks: Arc<dyn DatapathCallbacks>) -> std::io::Result<Self> {
        let n = std::thread::available_parallelism().unwrap_or(NonZeroUsize::new(1).unwrap());
        Self::new(n, NonZeroUsize::new(DEFAULT_MAX_BATCH_SIZE).unwrap(), callbacks)
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Spec §3 `Datapath`'s `max-batch-size`: the cap every `SendData`
    /// this datapath's callers construct must respect.
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn create_socket(&self, local: Option<SocketAddr>, remote: Option<SocketAddr>) -> Result<Socket> {
        Socket::create(local, remote, &self.processors, self.callbacks.clone())
    }
}
