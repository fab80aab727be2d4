//! `Socket`: N `SocketContext`s, one pinned to each `ProcessorContext`,
//! all sharing the same bound port (spec §4.4.1, §4.4.3).

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::callbacks::DatapathCallbacks;
use crate::error::Result;
use crate::processor::ProcessorContext;
use crate::socket::create as create_raw;
use crate::socket_ctx::{new_recv_pool, SocketContext};

pub struct Socket {
    pub contexts: Vec<Arc<SocketContext>>,
    pub local_port: u16,
    shutdown: AtomicBool,
}

impl Socket {
    /// `SocketCreateUdp`: open one socket per processor, binding every
    /// context after the first to the exact ephemeral port the first one
    /// chose, then register each with its processor's readiness loop.
    pub fn create(
        local: Option<SocketAddr>,
        remote: Option<SocketAddr>,
        processors: &[ProcessorContext],
        callbacks: Arc<dyn DatapathCallbacks>,
    ) -> Result<Self> {
        let mut contexts = Vec::with_capacity(processors.len());
        let mut first_port = None;

        for proc in processors {
            let (raw, port) = create_raw(local, remote, first_port)?;
            first_port.get_or_insert(port);
            let ctx = Arc::new(
                SocketContext::new(
                    raw,
                    proc.index,
                    port,
                    new_recv_pool(),
                    callbacks.clone(),
                    remote,
                )
                .map_err(crate::error::Error::Create)?,
            );
            proc.register(ctx.clone());
            contexts.push(ctx);
        }

        Ok(Self {
            contexts,
            local_port: first_port.unwrap_or(0),
            shutdown: AtomicBool::new(false),
        })
    }

    /// `SocketDelete`: mark every context for cleanup and release their
    /// pending sends and binding references, then wait for every
    /// readiness loop to observe the rundown and exit (spec §4.4.7).
    pub async fn delete(self) {
        self.shutdown.store(true, Ordering::Release);
        for ctx in &self.contexts {
            ctx.abort_pending();
            ctx.release_binding();
        }
        for ctx in &self.contexts {
            ctx.rundown.release_and_wait().await;
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
