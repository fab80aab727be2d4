//! `ProcessorContext`: one worker thread per logical processor, each
//! driving its own single-threaded `tokio` runtime. `UdpSocket::readable`/
//! `writable` give the same edge-triggered wakeup shape as the
//! epoll-based readiness loop this is modeled on (spec §4.4.2), without
//! exposing raw epoll registration to the rest of the crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use primitives::{ThreadConfig, ThreadFlags};
use tokio::sync::watch;

use crate::socket_ctx::SocketContext;

pub struct ProcessorContext {
    pub index: usize,
    handle: tokio::runtime::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl ProcessorContext {
    pub fn new(index: usize) -> std::io::Result<Self> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let thread = primitives::spawn(ThreadConfig {
            flags: ThreadFlags::NONE,
            ideal_processor: Some(index),
            name: format!("pal-proc-{index}"),
            entry: move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build processor runtime");
                let _ = ready_tx.send(runtime.handle().clone());
                runtime.block_on(async move {
                    let _ = shutdown_rx.changed().await;
                });
            },
        })?;

        let handle = ready_rx
            .recv()
            .expect("processor thread exited before its runtime was ready");

        Ok(Self {
            index,
            handle,
            thread: Some(thread),
            shutdown_tx,
        })
    }

    /// Spawn a `SocketContext`'s readiness loop onto this processor's
    /// runtime.
    pub fn register(&self, ctx: Arc<SocketContext>) {
        self.handle.spawn(readiness_loop(ctx));
    }

    /// Signal the worker's runtime to stop driving new work and join the
    /// thread. Outstanding `SocketContext` cleanup must already have
    /// completed (via their rundowns) before this is called.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for ProcessorContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn readiness_loop(ctx: Arc<SocketContext>) {
    loop {
        let guard = match ctx.rundown.acquire() {
            Ok(g) => g,
            Err(_) => return,
        };

        let has_pending = ctx.has_pending();
        tokio::select! {
            res = ctx.readable() => {
                match res {
                    Ok(()) => ctx.recv_all(),
                    Err(_) => ctx.check_unreachable(),
                }
            }
            res = ctx.writable(), if has_pending => {
                if res.is_ok() {
                    ctx.drain_pending();
                }
            }
        }
        drop(guard);
    }
}
