use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use agora_core::CanonicalError;
use agora_fabric::rpc::{self, RpcRequest};
use agora_fabric::transport::Dialer;
use serde::{de::DeserializeOwned, Serialize};
use url::{Host, Url};

use crate::error::{Error, Result};
use crate::strategy::{CallStrategy, Operation};

/// RPC transport for `rpc://host:port` endpoints.
///
/// Every attempt opens a fresh framed connection, sends one envelope and
/// reads one reply.
#[derive(Debug, Clone, Copy)]
pub struct RpcStrategy {
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl RpcStrategy {
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            io_timeout,
        }
    }
}

async fn socket_addr(endpoint: &Url) -> Result<SocketAddr> {
    let invalid = |why: &str| Error::InvalidEndpoint(endpoint.clone(), why.to_string());
    let port = endpoint.port().ok_or_else(|| invalid("missing port"))?;

    let domain = match endpoint.host() {
        Some(Host::Ipv4(ip)) => return Ok(SocketAddr::from((ip, port))),
        Some(Host::Ipv6(ip)) => return Ok(SocketAddr::from((ip, port))),
        Some(Host::Domain(domain)) => domain,
        None => return Err(invalid("missing host")),
    };

    // Non-special schemes keep IPv4 literals as opaque host text
    if let Ok(ip) = domain.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let resolved = tokio::net::lookup_host((domain, port))
        .await
        .map_err(agora_fabric::Error::from)?
        .next();

    resolved.ok_or_else(|| {
        agora_fabric::Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{domain} did not resolve"),
        ))
        .into()
    })
}

#[async_trait::async_trait]
impl CallStrategy for RpcStrategy {
    async fn attempt<Req, Res>(
        &self,
        endpoint: &Url,
        operation: &Operation,
        request: &Req,
    ) -> Result<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let envelope = RpcRequest::new(operation.route(), request)
            .map_err(|e| Error::Encode(e.to_string()))?;
        let addr = socket_addr(endpoint).await?;

        let dialer = Dialer::new(addr)
            .connect_timeout(self.connect_timeout)
            .io_timeout(self.io_timeout);

        let reply = rpc::invoke(&dialer, &envelope).await?;
        let code = CanonicalError::from_rpc(reply.code);
        if !code.is_ok() {
            return Err(Error::Rejected(code));
        }

        reply
            .decode()
            .map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}
