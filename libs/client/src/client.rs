use agora_core::CanonicalError;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::lookup::Lookup;
use crate::rest::RestStrategy;
use crate::retry;
use crate::rpc::RpcStrategy;
use crate::strategy::{CallStrategy, Operation};

/// Which strategy serves an endpoint, decided by its URI scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Rest,
    Rpc,
}

impl TransportKind {
    pub fn of(endpoint: &Url) -> Option<Self> {
        match endpoint.scheme() {
            "http" | "https" | "rest" => Some(Self::Rest),
            "rpc" => Some(Self::Rpc),
            _ => None,
        }
    }
}

/// Calls one logical service without knowing where or how it is served.
///
/// Each call resolves an endpoint through discovery, then retries
/// transport failures within the configured budget. Application-level
/// rejections come back immediately as the matching [`CanonicalError`].
pub struct ResilientClient<L> {
    service: String,
    lookup: L,
    config: ClientConfig,
    rest: RestStrategy,
    rpc: RpcStrategy,
}

impl<L: Lookup> ResilientClient<L> {
    pub fn new(service: impl Into<String>, lookup: L, config: ClientConfig) -> Result<Self> {
        let rest = RestStrategy::new(config.connect_timeout(), config.read_timeout())?;
        let rpc = RpcStrategy::new(config.connect_timeout(), config.read_timeout());
        Ok(Self {
            service: service.into(),
            lookup,
            config,
            rest,
            rpc,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// First live endpoint of the service, or `Timeout` when discovery
    /// finds none in time.
    pub async fn resolve(&self) -> std::result::Result<Url, CanonicalError> {
        let endpoints = self
            .lookup
            .lookup(&self.service, 1, self.config.lookup_timeout())
            .await;

        endpoints.into_iter().next().ok_or_else(|| {
            warn!(service = %self.service, "no live endpoint discovered");
            CanonicalError::Timeout
        })
    }

    /// Invoke `operation` over whichever transport the discovered endpoint
    /// speaks.
    pub async fn call<Req, Res>(
        &self,
        operation: &Operation,
        request: &Req,
    ) -> std::result::Result<Res, CanonicalError>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let endpoint = self.resolve().await?;
        match TransportKind::of(&endpoint) {
            Some(TransportKind::Rest) => self.drive(&self.rest, &endpoint, operation, request).await,
            Some(TransportKind::Rpc) => self.drive(&self.rpc, &endpoint, operation, request).await,
            None => {
                warn!(service = %self.service, %endpoint, "no transport for endpoint scheme");
                Err(CanonicalError::NotImplemented)
            }
        }
    }

    /// Invoke `operation` through an explicit strategy.
    pub async fn call_with<S, Req, Res>(
        &self,
        strategy: &S,
        operation: &Operation,
        request: &Req,
    ) -> std::result::Result<Res, CanonicalError>
    where
        S: CallStrategy,
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let endpoint = self.resolve().await?;
        self.drive(strategy, &endpoint, operation, request).await
    }

    async fn drive<S, Req, Res>(
        &self,
        strategy: &S,
        endpoint: &Url,
        operation: &Operation,
        request: &Req,
    ) -> std::result::Result<Res, CanonicalError>
    where
        S: CallStrategy,
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let service = self.service.as_str();
        retry::run(
            self.config.budget(),
            |error| strategy.classify(error),
            move |attempt| {
                debug!(service, %endpoint, route = %operation.route(), attempt, "calling");
                strategy.attempt(endpoint, operation, request)
            },
        )
        .await
    }
}
