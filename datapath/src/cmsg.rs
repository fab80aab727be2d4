//! Raw `recvmsg`/`sendmsg` ancillary-data handling. Every socket this
//! datapath opens is IPv6 dual-stack (§4.4.3), so ancillary data is always
//! read and written in its IPv6 form (`IPV6_PKTINFO`/`IPV6_TCLASS`) even
//! when the peer address turns out to be IPv4-mapped — `tokio`'s portable
//! socket API has no cmsg support, so this talks to the raw fd directly
//! once `readable()`/`writable()` has resolved.

use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV6};
use std::os::unix::io::RawFd;

use crate::addr::to_mapped_v6;
use crate::error::{Error, Result};
use crate::recv::RecvBlock;

/// Ample space for an `IPV6_PKTINFO` cmsg plus an `IPV6_TCLASS` cmsg.
const CONTROL_BUFFER_LEN: usize = 128;

/// Ancillary data the kernel is required to deliver with every datagram
/// (spec §4.4.4.3.a): both fields must be present or the caller treats it
/// as a kernel-contract violation.
pub struct Ancillary {
    pub local_ip: IpAddr,
    pub ifindex: i32,
    pub type_of_service: u8,
}

fn sockaddr_in6_to_std(addr: &libc::sockaddr_in6) -> SocketAddr {
    let ip = Ipv6Addr::from(addr.sin6_addr.s6_addr);
    let v6 = SocketAddrV6::new(ip, u16::from_be(addr.sin6_port), 0, addr.sin6_scope_id);
    crate::addr::from_mapped_v6(v6)
}

fn std_to_sockaddr_in6(addr: SocketAddrV6) -> libc::sockaddr_in6 {
    let mut s: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
    s.sin6_family = libc::AF_INET6 as libc::sa_family_t;
    s.sin6_port = addr.port().to_be();
    s.sin6_addr = libc::in6_addr {
        s6_addr: addr.ip().octets(),
    };
    s.sin6_scope_id = addr.scope_id();
    s
}

/// Receive one datagram into `block`. Returns `Ok(None)` on
/// `EAGAIN`/`EWOULDBLOCK` (caller should re-arm readiness and retry);
/// `Err(MissingAncillaryData(..))` if the kernel omitted local-address or
/// TOS data — a hard invariant violation the caller is expected to treat
/// as fatal for that socket context, not silently skip.
pub fn recv_one(fd: RawFd, block: &mut RecvBlock) -> Result<Option<Ancillary>> {
    unsafe {
        let mut name: libc::sockaddr_in6 = std::mem::zeroed();
        let mut control = [0u8; CONTROL_BUFFER_LEN];
        let mut iov = libc::iovec {
            iov_base: block.buffer.as_mut_ptr() as *mut libc::c_void,
            iov_len: block.buffer.len(),
        };
        let mut msg: libc::msghdr = std::mem::zeroed();
        msg.msg_name = &mut name as *mut _ as *mut libc::c_void;
        msg.msg_namelen = std::mem::size_of::<libc::sockaddr_in6>() as u32;
        msg.msg_iov = &mut iov;
        msg.msg_iovlen = 1;
        msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
        msg.msg_controllen = control.len() as _;

        let n = libc::recvmsg(fd, &mut msg, 0);
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return Ok(None);
            }
            return Err(Error::Recv(err));
        }
        block.len = n as usize;
        block.remote = sockaddr_in6_to_std(&name);

        let mut local_ip = None;
        let mut ifindex = 0i32;
        let mut tos = None;

        let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
        while !cmsg.is_null() {
            let c = &*cmsg;
            match (c.cmsg_level, c.cmsg_type) {
                (libc::IPPROTO_IP, libc::IP_PKTINFO) => {
                    let info = *(libc::CMSG_DATA(cmsg) as *const libc::in_pktinfo);
                    local_ip = Some(IpAddr::V4(std::net::Ipv4Addr::from(u32::from_be(
                        info.ipi_addr.s_addr,
                    ))));
                    ifindex = info.ipi_ifindex;
                }
                (libc::IPPROTO_IPV6, libc::IPV6_PKTINFO) => {
                    let info = *(libc::CMSG_DATA(cmsg) as *const libc::in6_pktinfo);
                    local_ip = Some(IpAddr::V6(Ipv6Addr::from(info.ipi6_addr.s6_addr)));
                    ifindex = info.ipi6_ifindex as i32;
                }
                (libc::IPPROTO_IP, libc::IP_TOS) => {
                    tos = Some(*(libc::CMSG_DATA(cmsg) as *const u8));
                }
                (libc::IPPROTO_IPV6, libc::IPV6_TCLASS) => {
                    let v = *(libc::CMSG_DATA(cmsg) as *const libc::c_int);
                    tos = Some(v as u8);
                }
                _ => {}
            }
            cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
        }

        let local_ip = local_ip.ok_or(Error::MissingAncillaryData("local address (pktinfo)"))?;
        let type_of_service = tos.ok_or(Error::MissingAncillaryData("type of service"))?;
        block.type_of_service = type_of_service;
        Ok(Some(Ancillary {
            local_ip,
            ifindex,
            type_of_service,
        }))
    }
}

unsafe fn push_cmsg<T>(
    buf: &mut [u8],
    offset: &mut usize,
    level: libc::c_int,
    cmsg_type: libc::c_int,
    value: &T,
) {
    let space = libc::CMSG_SPACE(std::mem::size_of::<T>() as u32) as usize;
    assert!(*offset + space <= buf.len(), "control buffer too small");
    let header = buf[*offset..].as_mut_ptr() as *mut libc::cmsghdr;
    (*header).cmsg_level = level;
    (*header).cmsg_type = cmsg_type;
    (*header).cmsg_len = libc::CMSG_LEN(std::mem::size_of::<T>() as u32) as _;
    std::ptr::copy_nonoverlapping(
        value as *const T as *const u8,
        libc::CMSG_DATA(header),
        std::mem::size_of::<T>(),
    );
    *offset += space;
}

fn fill_ecn_and_pktinfo_cmsgs(control: &mut [u8], ecn: u8, local: Option<IpAddr>) -> usize {
    let mut offset = 0usize;
    let tclass: libc::c_int = ecn as libc::c_int;
    unsafe {
        push_cmsg(control, &mut offset, libc::IPPROTO_IPV6, libc::IPV6_TCLASS, &tclass);
        if let Some(ip) = local {
            let mapped = match ip {
                IpAddr::V4(v4) => v4.to_ipv6_mapped(),
                IpAddr::V6(v6) => v6,
            };
            let info = libc::in6_pktinfo {
                ipi6_addr: libc::in6_addr { s6_addr: mapped.octets() },
                ipi6_ifindex: 0,
            };
            push_cmsg(control, &mut offset, libc::IPPROTO_IPV6, libc::IPV6_PKTINFO, &info);
        }
    }
    offset
}

/// Send a `SendData` batch as one `sendmmsg` call — up to `MaxBatchSize`
/// buffers, each its own UDP datagram to the same `remote`/`ecn`/`local`
/// (spec §3 `SendData`: "a batch of up to `MaxBatchSize` buffers ... plus
/// parallel scatter/gather vectors"). Returns the number of buffers the
/// kernel actually queued; a result short of `buffers.len()` means the
/// socket hit `EAGAIN` partway through and the remainder must be retried.
pub fn send_batch(
    fd: RawFd,
    buffers: &[Vec<u8>],
    local: Option<IpAddr>,
    remote: SocketAddr,
    ecn: u8,
) -> Result<usize> {
    if buffers.is_empty() {
        return Ok(0);
    }
    unsafe {
        let remote_v6 = to_mapped_v6(remote);
        let mut names = vec![std_to_sockaddr_in6(remote_v6); buffers.len()];
        let mut iovs: Vec<libc::iovec> = buffers
            .iter()
            .map(|buf| libc::iovec {
                iov_base: buf.as_ptr() as *mut libc::c_void,
                iov_len: buf.len(),
            })
            .collect();
        let mut controls = vec![[0u8; CONTROL_BUFFER_LEN]; buffers.len()];
        let mut control_lens = vec![0usize; buffers.len()];
        for i in 0..buffers.len() {
            control_lens[i] = fill_ecn_and_pktinfo_cmsgs(&mut controls[i], ecn, local);
        }

        let mut msgs: Vec<libc::mmsghdr> = (0..buffers.len())
            .map(|i| {
                let mut hdr: libc::msghdr = std::mem::zeroed();
                hdr.msg_name = &mut names[i] as *mut _ as *mut libc::c_void;
                hdr.msg_namelen = std::mem::size_of::<libc::sockaddr_in6>() as u32;
                hdr.msg_iov = &mut iovs[i];
                hdr.msg_iovlen = 1;
                hdr.msg_control = controls[i].as_mut_ptr() as *mut libc::c_void;
                hdr.msg_controllen = control_lens[i] as _;
                libc::mmsghdr { msg_hdr: hdr, msg_len: 0 }
            })
            .collect();

        let n = libc::sendmmsg(fd, msgs.as_mut_ptr(), msgs.len() as u32, 0);
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::WouldBlock {
                return Ok(0);
            }
            return Err(Error::Send(err));
        }
        Ok(n as usize)
    }
}
