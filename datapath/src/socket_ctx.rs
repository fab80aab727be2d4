//! `SocketContext`: one UDP fd pinned to one `ProcessorContext`, with its
//! receive-block pool and pending-send FIFO.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use primitives::{Pool, Rundown, RundownRef};

use crate::callbacks::DatapathCallbacks;
use crate::cmsg;
use crate::error::Result;
use crate::recv::{self, OwnedRecvBlock, RecvBlock};
use crate::send::SendData;

pub struct SocketContext {
    pub processor_index: usize,
    pub local_port: u16,
    socket: tokio::net::UdpSocket,
    recv_pool: Arc<Pool<RecvBlock>>,
    pending: Mutex<VecDeque<SendData>>,
    send_waiting: AtomicBool,
    pub rundown: Rundown,
    binding: Mutex<Option<RundownRef>>,
    callbacks: Arc<dyn DatapathCallbacks>,
    configured_remote: Option<SocketAddr>,
}

impl SocketContext {
    pub fn new(
        socket: socket2::Socket,
        processor_index: usize,
        local_port: u16,
        recv_pool: Arc<Pool<RecvBlock>>,
        callbacks: Arc<dyn DatapathCallbacks>,
        configured_remote: Option<SocketAddr>,
    ) -> std::io::Result<Self> {
        let std_socket: std::net::UdpSocket = socket.into();
        let socket = tokio::net::UdpSocket::from_std(std_socket)?;
        let rundown = Rundown::new();
        let binding = rundown.acquire().expect("fresh rundown is always acquirable");
        Ok(Self {
            processor_index,
            local_port,
            socket,
            recv_pool,
            pending: Mutex::new(VecDeque::new()),
            send_waiting: AtomicBool::new(false),
            rundown,
            binding: Mutex::new(Some(binding)),
            callbacks,
            configured_remote,
        })
    }

    /// Release the long-lived binding reference taken at construction
    /// (spec §4.4.3 step 5, "acquire the bindings rundown"). Called during
    /// shutdown cleanup so the rundown can eventually drain to zero.
    pub fn release_binding(&self) {
        self.binding.lock().unwrap().take();
    }

    pub fn has_pending(&self) -> bool {
        self.send_waiting.load(Ordering::Acquire)
    }

    pub async fn readable(&self) -> std::io::Result<()> {
        self.socket.readable().await
    }

    pub async fn writable(&self) -> std::io::Result<()> {
        self.socket.writable().await
    }

    /// Drain every ready datagram on this fd, handing each to the
    /// `receive` callback. Panics if the kernel omits required ancillary
    /// data (spec's hard invariant — §4.4.4.3.a, resolved Open Question
    /// #2 in the grounding ledger).
    pub fn recv_all(&self) {
        loop {
            let mut block = self.recv_pool.get();
            block.reset();
            match cmsg::recv_one(self.socket.as_raw_fd(), &mut block) {
                Ok(None) => {
                    self.recv_pool.put(block);
                    return;
                }
                Ok(Some(anc)) => {
                    block.local = SocketAddr::new(anc.local_ip, self.local_port);
                    block.partition_index = self.processor_index;
                    let owned = OwnedRecvBlock::new(block, self.recv_pool.clone());
                    self.callbacks.receive(owned);
                }
                Err(crate::error::Error::MissingAncillaryData(which)) => {
                    panic!("kernel omitted required ancillary data: {which}");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "recv error, dropping datagram");
                    self.recv_pool.put(block);
                    return;
                }
            }
        }
    }

    /// Public `Send` entry point (spec §4.4.5).
    pub fn send(&self, data: SendData) -> Result<()> {
        self.try_send(data, false)
    }

    fn try_send(&self, mut data: SendData, is_retry: bool) -> Result<()> {
        match cmsg::send_batch(self.socket.as_raw_fd(), &data.buffers, data.local, data.remote, data.ecn) {
            Ok(sent) if sent == data.buffers.len() => Ok(()),
            Ok(sent) => {
                data.drop_sent(sent);
                self.pend(data, is_retry);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "permanent send error");
                Err(e)
            }
        }
    }

    fn pend(&self, data: SendData, is_retry: bool) {
        let mut pending = self.pending.lock().unwrap();
        if is_retry {
            pending.push_front(data);
        } else {
            pending.push_back(data);
        }
        self.send_waiting.store(true, Ordering::Release);
    }

    /// Drain the FIFO on writable readiness, stopping at the first entry
    /// that pends again so arrival order (with retry priority) is
    /// preserved.
    pub fn drain_pending(&self) {
        loop {
            let next = self.pending.lock().unwrap().pop_front();
            let Some(mut data) = next else {
                self.send_waiting.store(false, Ordering::Release);
                return;
            };
            match cmsg::send_batch(self.socket.as_raw_fd(), &data.buffers, data.local, data.remote, data.ecn) {
                Ok(sent) if sent == data.buffers.len() => continue,
                Ok(sent) => {
                    data.drop_sent(sent);
                    self.pending.lock().unwrap().push_front(data);
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "permanent send error while draining");
                    continue;
                }
            }
        }
    }

    /// Check `SO_ERROR` after an `EPOLLERR`-equivalent readiness event and
    /// invoke `unreachable` if it names one of the expected ICMP-derived
    /// errors (spec §4.4.6).
    pub fn check_unreachable(&self) {
        let fd = self.socket.as_raw_fd();
        let mut err: libc::c_int = 0;
        let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
        let ret = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_ERROR,
                &mut err as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        if ret != 0 {
            return;
        }
        match err {
            libc::ECONNREFUSED | libc::EHOSTUNREACH | libc::ENETUNREACH => {
                if let Some(remote) = self.configured_remote {
                    self.callbacks.unreachable(remote);
                }
            }
            0 => {}
            other => {
                tracing::debug!(errno = other, "non-fatal socket error observed");
            }
        }
    }

    /// Release every pended `SendData` with an aborted status, for
    /// shutdown cleanup (spec §4.4.7). The caller is responsible for
    /// surfacing the abort to whatever owns these sends; here that's
    /// simply dropping them.
    pub fn abort_pending(&self) {
        self.pending.lock().unwrap().clear();
        self.send_waiting.store(false, Ordering::Release);
    }
}

pub fn new_recv_pool() -> Arc<Pool<RecvBlock>> {
    Arc::new(recv::new_pool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    struct NoopCallbacks;
    impl DatapathCallbacks for NoopCallbacks {
        fn receive(&self, _block: OwnedRecvBlock) {}
        fn unreachable(&self, _remote: SocketAddr) {}
    }

    fn new_ctx() -> SocketContext {
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4433);
        let (raw, port) = crate::socket::create(None, None, None).unwrap();
        SocketContext::new(raw, 0, port, new_recv_pool(), Arc::new(NoopCallbacks), Some(remote)).unwrap()
    }

    /// Spec §8 scenario 4: new sends append, retries (a send that hit
    /// `EAGAIN` while draining) re-insert at the front, so arrival order
    /// is preserved across a retry.
    #[tokio::test]
    async fn retries_are_prepended_ahead_of_new_sends() {
        let ctx = new_ctx();
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4433);

        let first = SendData::new(vec![b"first".to_vec()], remote, 0, 1).unwrap();
        let second = SendData::new(vec![b"second".to_vec()], remote, 0, 1).unwrap();
        let retried = SendData::new(vec![b"first-retry".to_vec()], remote, 0, 1).unwrap();

        ctx.pend(first, false);
        ctx.pend(second, false);
        // Draining pops "first" off the front, it hits EAGAIN again and is
        // re-pended as a retry: it must jump back ahead of "second".
        ctx.pend(retried, true);

        let order: Vec<Vec<u8>> = ctx.pending.lock().unwrap().iter().map(|d| d.buffers[0].clone()).collect();
        assert_eq!(order, vec![b"first-retry".to_vec(), b"second".to_vec()]);
    }

    /// Spec §3 `SendData`: a batch of more than one buffer is still one
    /// submission, sent as one `sendmmsg` call.
    #[tokio::test]
    async fn send_data_rejects_a_batch_over_max_batch_size() {
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4433);
        let err = SendData::new(vec![b"a".to_vec(), b"b".to_vec()], remote, 0, 1).unwrap_err();
        assert!(matches!(err, crate::error::Error::BatchSize { len: 2, max: 1 }));
    }

    #[tokio::test]
    async fn abort_pending_clears_queue_and_flag() {
        let ctx = new_ctx();
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4433);
        ctx.pend(SendData::new(vec![b"queued".to_vec()], remote, 0, 1).unwrap(), false);
        assert!(ctx.has_pending());

        ctx.abort_pending();
        assert!(!ctx.has_pending());
        assert!(ctx.pending.lock().unwrap().is_empty());
    }
}
