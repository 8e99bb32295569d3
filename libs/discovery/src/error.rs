use std::net::SocketAddrV4;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No usable network interface: need one that is up, non-loopback and multicast-capable")]
    NoUsableInterface,

    #[error("Pinned interface {0} is not usable for multicast")]
    InterfaceUnavailable(std::net::Ipv4Addr),

    #[error("Not an IPv4 multicast group: {0}")]
    InvalidGroup(SocketAddrV4),

    #[error("Invalid announcement: {0}")]
    InvalidAnnouncement(String),

    #[error("Malformed announcement: {0}")]
    MalformedAnnouncement(String),

    #[error("Discovery was shut down and cannot be restarted")]
    ShutDown,

    #[error(transparent)]
    Config(#[from] agora_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
