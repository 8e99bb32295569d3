use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use super::{within, Framed, Limits};
use crate::error::{Result, Stage};

pub type TcpFramed = Framed<TcpStream>;

/// Opens framed TCP connections to one peer address
#[derive(Debug, Clone, Copy)]
pub struct Dialer {
    addr: SocketAddr,
    connect_timeout: Option<Duration>,
    limits: Limits,
}

impl Dialer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: None,
            limits: Limits::default(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bound every send and every receive on the connection
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.limits.send_timeout = Some(timeout);
        self.limits.receive_timeout = Some(timeout);
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.limits.receive_timeout = Some(timeout);
        self
    }

    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.limits.max_frame_len = len;
        self
    }

    pub async fn dial(&self) -> Result<TcpFramed> {
        let addr = self.addr;
        let stream = within(self.connect_timeout, Stage::Connect, async move {
            Ok(TcpStream::connect(addr).await?)
        })
        .await?;
        stream.set_nodelay(true)?;
        Ok(Framed::new(stream, self.limits))
    }
}

/// Accepts inbound TCP connections as framed streams
pub struct FrameListener {
    listener: TcpListener,
    limits: Limits,
}

impl FrameListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            limits: Limits::default(),
        })
    }

    /// Limits applied to every accepted connection
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn accept(&self) -> Result<(TcpFramed, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((Framed::new(stream, self.limits), peer))
    }
}
