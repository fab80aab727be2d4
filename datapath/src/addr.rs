//! IPv4 <-> IPv4-mapped-IPv6 conversion, since every socket in this
//! datapath is opened dual-stack and addresses are carried internally in
//! mapped form.

use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV6};

/// Convert any address to its IPv4-mapped IPv6 form for use with the
/// dual-stack socket.
pub fn to_mapped_v6(addr: SocketAddr) -> SocketAddrV6 {
    match addr {
        SocketAddr::V6(v6) => v6,
        SocketAddr::V4(v4) => {
            let mapped = v4.ip().to_ipv6_mapped();
            SocketAddrV6::new(mapped, v4.port(), 0, 0)
        }
    }
}

/// Convert a mapped-v6 address back to its original family.
pub fn from_mapped_v6(addr: SocketAddrV6) -> SocketAddr {
    if let Some(v4) = addr.ip().to_ipv4_mapped() {
        SocketAddr::new(IpAddr::V4(v4), addr.port())
    } else {
        SocketAddr::V6(addr)
    }
}
