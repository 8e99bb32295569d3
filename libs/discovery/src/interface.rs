//! Choosing the network interface that joins the multicast group.

use std::net::{Ipv4Addr, SocketAddrV4};

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use tracing::debug;

use crate::error::{Error, Result};

/// One IPv4 address of a local interface together with the flags we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCandidate {
    pub name: String,
    pub addr: Ipv4Addr,
    pub up: bool,
    pub loopback: bool,
    pub multicast: bool,
}

impl InterfaceCandidate {
    pub fn is_usable(&self) -> bool {
        self.up && !self.loopback && self.multicast
    }
}

/// List IPv4 addresses of every local interface.
pub fn enumerate() -> Result<Vec<InterfaceCandidate>> {
    let addrs = getifaddrs().map_err(std::io::Error::from)?;

    let candidates = addrs
        .filter_map(|ifaddr| {
            let sin = ifaddr.address.as_ref()?.as_sockaddr_in()?;
            let addr = *SocketAddrV4::from(*sin).ip();
            Some(InterfaceCandidate {
                name: ifaddr.interface_name.clone(),
                addr,
                up: ifaddr.flags.contains(InterfaceFlags::IFF_UP),
                loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
                multicast: ifaddr.flags.contains(InterfaceFlags::IFF_MULTICAST),
            })
        })
        .collect();

    Ok(candidates)
}

/// Pick the interface to use from `candidates`.
///
/// With `pinned` set, only that address is accepted. Otherwise the first
/// usable candidate wins.
pub fn select(candidates: &[InterfaceCandidate], pinned: Option<Ipv4Addr>) -> Result<InterfaceCandidate> {
    match pinned {
        Some(addr) => candidates
            .iter()
            .find(|c| c.addr == addr && c.up && c.multicast)
            .cloned()
            .ok_or(Error::InterfaceUnavailable(addr)),
        None => candidates
            .iter()
            .find(|c| c.is_usable())
            .cloned()
            .ok_or(Error::NoUsableInterface),
    }
}

/// Enumerate local interfaces and select one for multicast.
pub fn resolve(pinned: Option<Ipv4Addr>) -> Result<InterfaceCandidate> {
    let candidates = enumerate()?;
    debug!(?candidates, "local interfaces");
    select(&candidates, pinned)
}
