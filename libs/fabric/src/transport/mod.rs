//! Length-prefixed framing over any byte stream.
//!
//! A frame is a 4-byte big-endian length followed by that many bytes.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result, Stage};

pub mod tcp;

pub use self::tcp::{Dialer, FrameListener, TcpFramed};

/// Largest frame accepted from a peer (16 MiB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Per-connection I/O limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub send_timeout: Option<Duration>,
    pub receive_timeout: Option<Duration>,
    pub max_frame_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            send_timeout: None,
            receive_timeout: None,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

/// A byte stream read and written one frame at a time
pub struct Framed<S> {
    stream: S,
    limits: Limits,
}

impl<S> Framed<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, limits: Limits) -> Self {
        Self { stream, limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        let stream = &mut self.stream;

        within(self.limits.send_timeout, Stage::Send, async move {
            stream.write_u32(len).await?;
            stream.write_all(payload).await?;
            stream.flush().await?;
            Ok(())
        })
        .await
    }

    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let max = self.limits.max_frame_len;
        let stream = &mut self.stream;

        within(self.limits.receive_timeout, Stage::Receive, async move {
            let len = stream.read_u32().await.map_err(eof_as_closed)? as usize;
            if len > max {
                return Err(Error::FrameTooLarge { len, max });
            }

            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).await.map_err(eof_as_closed)?;
            Ok(payload)
        })
        .await
    }

    /// Flush and close the write half
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

pub(crate) async fn within<T>(
    limit: Option<Duration>,
    stage: Stage,
    op: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(limit) = limit else {
        return op.await;
    };
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| Error::Timeout(stage))?
}

fn eof_as_closed(err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::ConnectionClosed,
        _ => Error::Io(err),
    }
}
