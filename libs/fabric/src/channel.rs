use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::Codec;
use crate::error::Result;
use crate::transport::{Dialer, Framed};

/// Typed messages over a framed stream
pub struct Channel<S, C> {
    framed: Framed<S>,
    codec: C,
}

impl<S, C> Channel<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    C: Codec,
{
    pub fn new(framed: Framed<S>, codec: C) -> Self {
        Self { framed, codec }
    }

    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let payload = self.codec.encode(message)?;
        self.framed.write_frame(&payload).await
    }

    pub async fn receive<T: DeserializeOwned>(&mut self) -> Result<T> {
        let payload = self.framed.read_frame().await?;
        self.codec.decode(&payload)
    }

    /// Send one message and wait for the reply
    pub async fn exchange<Req, Res>(&mut self, request: &Req) -> Result<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send(request).await?;
        self.receive().await
    }

    pub async fn close(mut self) -> Result<()> {
        self.framed.shutdown().await
    }
}

impl<C: Codec> Channel<TcpStream, C> {
    pub async fn dial(dialer: &Dialer, codec: C) -> Result<Self> {
        Ok(Self::new(dialer.dial().await?, codec))
    }
}

/// Open a connection, exchange exactly one request and reply, and hang up.
///
/// The dialer's timeouts bound each stage separately.
pub async fn round_trip<Req, Res, C>(dialer: &Dialer, request: &Req, codec: C) -> Result<Res>
where
    Req: Serialize,
    Res: DeserializeOwned,
    C: Codec,
{
    let mut channel = Channel::dial(dialer, codec).await?;
    let reply = channel.exchange(request).await?;
    // the reply is already in hand
    if let Err(e) = channel.close().await {
        debug!(peer = %dialer.addr(), error = %e, "closing after round trip");
    }
    Ok(reply)
}
