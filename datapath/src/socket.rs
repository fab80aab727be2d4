//! Socket creation: one IPv6 dual-stack, nonblocking, close-on-exec UDP
//! socket per `SocketContext`, with the exact option sequence spec
//! §4.4.3 lists. Any option failure aborts creation of that socket.

use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use socket2::{Domain, Protocol, Socket as Socket2, Type};

use crate::addr::to_mapped_v6;
use crate::error::{Error, Result};

fn setsockopt<T>(fd: RawFd, level: libc::c_int, name: libc::c_int, value: T, label: &'static str) -> Result<()> {
    let ret = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &value as *const T as *const libc::c_void,
            std::mem::size_of::<T>() as libc::socklen_t,
        )
    };
    if ret != 0 {
        Err(Error::SocketOption(label, std::io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

/// Create and fully configure one UDP socket for a `SocketContext`.
///
/// `required_port`, when set, is the port the first `SocketContext` of
/// this `Socket` bound to — every subsequent context must bind *that exact
/// port* (spec §4.4.3 step 4), so the bind address is rewritten to use it
/// before `bind` is called, not merely checked against the result.
/// Returns the socket and the port it ended up bound to.
pub fn create(
    local: Option<SocketAddr>,
    remote: Option<SocketAddr>,
    required_port: Option<u16>,
) -> Result<(Socket2, u16)> {
    let socket = Socket2::new(Domain::IPV6, Type::DGRAM.nonblocking(), Some(Protocol::UDP))
        .map_err(Error::Create)?;
    let fd = socket.as_raw_fd();

    setsockopt(fd, libc::IPPROTO_IPV6, libc::IPV6_V6ONLY, 0i32, "IPV6_V6ONLY")?;

    setsockopt(fd, libc::IPPROTO_IP, libc::IP_MTU_DISCOVER, libc::IP_PMTUDISC_DO, "IP_MTU_DISCOVER")?;
    setsockopt(fd, libc::IPPROTO_IPV6, libc::IPV6_DONTFRAG, 1i32, "IPV6_DONTFRAG")?;

    setsockopt(fd, libc::IPPROTO_IPV6, libc::IPV6_RECVPKTINFO, 1i32, "IPV6_RECVPKTINFO")?;
    setsockopt(fd, libc::IPPROTO_IP, libc::IP_PKTINFO, 1i32, "IP_PKTINFO")?;

    setsockopt(fd, libc::IPPROTO_IPV6, libc::IPV6_RECVTCLASS, 1i32, "IPV6_RECVTCLASS")?;
    setsockopt(fd, libc::IPPROTO_IP, libc::IP_RECVTOS, 1i32, "IP_RECVTOS")?;

    // Best-effort: a kernel-capped SO_RCVBUF failure is not fatal.
    let _ = socket.set_recv_buffer_size(i32::MAX as usize);

    setsockopt(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, 1i32, "SO_REUSEADDR")?;
    setsockopt(fd, libc::SOL_SOCKET, libc::SO_REUSEPORT, 1i32, "SO_REUSEPORT")?;

    let mut bind_local = local.unwrap_or_else(|| SocketAddr::new(std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED), 0));
    if let Some(port) = required_port {
        bind_local.set_port(port);
    }
    let bind_addr = to_mapped_v6(bind_local);
    socket.bind(&bind_addr.into()).map_err(Error::Bind)?;

    if let Some(remote) = remote {
        let remote_v6 = to_mapped_v6(remote);
        socket.connect(&remote_v6.into()).map_err(Error::Bind)?;
    }

    let bound: SocketAddr = socket
        .local_addr()
        .map_err(Error::Bind)?
        .as_socket()
        .expect("IPv6 socket always yields a SocketAddr");
    let port = bound.port();

    if let Some(first) = required_port {
        if first != port {
            return Err(Error::PortMismatch { first, got: port });
        }
    }

    Ok((socket, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_ephemeral_port_socket() {
        let (_socket, port) = create(None, None, None).unwrap();
        assert!(port > 0);
    }

    /// Spec §4.4.3 step 4: every `SocketContext` after the first must bind
    /// the exact port the first one was assigned, not merely report a
    /// mismatch after binding wherever it landed. `SO_REUSEPORT` (set
    /// above) is what makes binding the second socket to that same port
    /// possible at all.
    #[test]
    fn second_context_binds_to_first_contexts_port() {
        let (_first, port) = create(None, None, None).unwrap();
        let (_second, second_port) = create(None, None, Some(port)).unwrap();
        assert_eq!(second_port, port);
    }
}
