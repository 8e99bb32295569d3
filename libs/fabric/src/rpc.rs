//! RPC transport: bincode envelopes over length-prefixed TCP frames.
//!
//! A request names a route (`"GET users/alice"`) and carries an opaque
//! bincode payload. The reply carries an [`RpcCode`] so the caller can tell
//! an application-level rejection apart from a broken connection.

use std::net::SocketAddr;
use std::sync::Arc;

use agora_core::{CanonicalError, RpcCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::channel::{round_trip, Channel};
use crate::codec::{BincodeCodec, Codec};
use crate::error::{Error, Result};
use crate::transport::{Dialer, FrameListener, Limits, TcpFramed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub route: String,
    pub payload: Vec<u8>,
}

impl RpcRequest {
    pub fn new<T: Serialize>(route: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self {
            route: route.into(),
            payload: BincodeCodec::default().encode(body)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        BincodeCodec::default().decode(&self.payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub code: RpcCode,
    pub payload: Vec<u8>,
    pub message: Option<String>,
}

impl RpcResponse {
    pub fn ok<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self {
            code: RpcCode::Ok,
            payload: BincodeCodec::default().encode(body)?,
            message: None,
        })
    }

    pub fn error(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            payload: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Reply for a handler that failed with a canonical error
    pub fn rejected(error: CanonicalError) -> Self {
        Self::error(error.to_rpc(), error.to_string())
    }

    pub fn unimplemented(route: &str) -> Self {
        Self::error(RpcCode::Unimplemented, format!("no handler for {route}"))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        BincodeCodec::default().decode(&self.payload)
    }
}

/// Server-side dispatch for inbound RPC requests
#[async_trait::async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    async fn handle(&self, request: RpcRequest) -> RpcResponse;
}

/// Accepts framed connections and answers each request through a handler
pub struct RpcServer {
    listener: FrameListener,
}

impl RpcServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        Ok(Self {
            listener: FrameListener::bind(addr).await?,
        })
    }

    /// Limits for every connection accepted from now on
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.listener = self.listener.with_limits(limits);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the task is dropped or aborted
    pub async fn serve<H: RpcHandler>(self, handler: Arc<H>) {
        loop {
            match self.listener.accept().await {
                Ok((framed, peer)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(framed, handler).await {
                            debug!(%peer, error = %e, "rpc connection ended");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "rpc accept failed");
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }
        }
    }
}

async fn serve_connection<H: RpcHandler>(framed: TcpFramed, handler: Arc<H>) -> Result<()> {
    let mut channel = Channel::new(framed, BincodeCodec::default());

    loop {
        let request: RpcRequest = match channel.receive().await {
            Ok(request) => request,
            Err(Error::ConnectionClosed) => return Ok(()),
            Err(Error::Codec(msg)) => {
                channel
                    .send(&RpcResponse::error(RpcCode::InvalidArgument, msg))
                    .await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!(route = %request.route, "rpc request");
        let response = handler.handle(request).await;
        channel.send(&response).await?;
    }
}

/// Issue one request over a fresh connection
pub async fn invoke(dialer: &Dialer, request: &RpcRequest) -> Result<RpcResponse> {
    round_trip(dialer, request, BincodeCodec::default()).await
}
