use std::net::{Ipv4Addr, SocketAddrV4};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Open the single UDP socket shared by the announcer and the listener.
///
/// Several processes on one host bind the same group port, so the address is
/// reusable. Our own announcements loop back so co-located services see
/// each other.
pub fn open(group: SocketAddrV4, interface: Ipv4Addr, hops: u32) -> Result<UdpSocket> {
    if !group.ip().is_multicast() {
        return Err(Error::InvalidGroup(group));
    }

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;

    let bind = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());
    socket.bind(&SockAddr::from(bind))?;

    socket.join_multicast_v4(group.ip(), &interface)?;
    socket.set_multicast_if_v4(&interface)?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_multicast_ttl_v4(hops)?;
    socket.set_nonblocking(true)?;

    Ok(UdpSocket::from_std(socket.into())?)
}
