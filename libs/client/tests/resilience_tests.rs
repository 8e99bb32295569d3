use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use agora_client::{
    CallStrategy, ClientConfig, Error, Lookup, Operation, ResilientClient, Result,
};
use agora_core::CanonicalError;
use agora_discovery::{Discovery, DiscoveryConfig};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::Instant;
use url::Url;

/// Lookup that always reports the same endpoints
struct Fixed(Vec<Url>);

#[async_trait::async_trait]
impl Lookup for Fixed {
    async fn lookup(&self, _service: &str, _min: usize, _timeout: Duration) -> Vec<Url> {
        self.0.clone()
    }
}

fn endpoint() -> Fixed {
    Fixed(vec![Url::parse("rpc://10.0.0.4:9000").unwrap()])
}

fn config(attempts: u32) -> ClientConfig {
    ClientConfig::default()
        .with_max_attempts(attempts)
        .with_retry_delay(Duration::from_millis(50))
        .with_lookup_timeout(Duration::from_millis(100))
}

/// Fails at the transport layer `failures` times, then answers `"pong"`.
struct Flaky {
    failures: u32,
    calls: AtomicU32,
}

impl Flaky {
    fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CallStrategy for Flaky {
    async fn attempt<Req, Res>(&self, _: &Url, _: &Operation, _: &Req) -> Result<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
            return Err(Error::Fabric(agora_fabric::Error::Io(refused)));
        }
        serde_json::from_value(serde_json::json!("pong"))
            .map_err(|e| Error::MalformedResponse(e.to_string()))
    }
}

/// Answers every attempt with an application-level rejection.
struct Rejecting {
    code: CanonicalError,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl CallStrategy for Rejecting {
    async fn attempt<Req, Res>(&self, _: &Url, _: &Operation, _: &Req) -> Result<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Rejected(self.code))
    }
}

#[tokio::test]
async fn transient_failures_within_budget_end_in_success() {
    let client = ResilientClient::new("Users", endpoint(), config(3)).unwrap();
    let flaky = Flaky::new(2);

    let reply: std::result::Result<String, _> =
        client.call_with(&flaky, &Operation::get("users/alice"), &()).await;

    assert_eq!(reply, Ok("pong".to_string()));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn exhausting_the_budget_is_timeout() {
    let client = ResilientClient::new("Users", endpoint(), config(3)).unwrap();
    let flaky = Flaky::new(10);

    let reply: std::result::Result<String, _> =
        client.call_with(&flaky, &Operation::get("users/alice"), &()).await;

    assert_eq!(reply, Err(CanonicalError::Timeout));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn application_rejection_is_returned_without_retry() {
    let client = ResilientClient::new("Users", endpoint(), config(5)).unwrap();

    for code in [
        CanonicalError::NotFound,
        CanonicalError::Conflict,
        CanonicalError::Forbidden,
        CanonicalError::BadRequest,
    ] {
        let rejecting = Rejecting {
            code,
            calls: AtomicU32::new(0),
        };

        let start = Instant::now();
        let reply: std::result::Result<String, _> = client
            .call_with(&rejecting, &Operation::get("users/ghost"), &())
            .await;

        assert_eq!(reply, Err(code));
        assert_eq!(rejecting.calls.load(Ordering::SeqCst), 1);
        // no retry delay was slept
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}

#[tokio::test]
async fn no_live_endpoint_is_timeout_without_attempts() {
    let client = ResilientClient::new("Users", Fixed(Vec::new()), config(3)).unwrap();
    let flaky = Flaky::new(0);

    let reply: std::result::Result<String, _> =
        client.call_with(&flaky, &Operation::get("users/alice"), &()).await;

    assert_eq!(reply, Err(CanonicalError::Timeout));
    assert_eq!(flaky.calls(), 0);
}

#[tokio::test]
async fn discovery_lookup_waits_for_its_timeout() {
    // Never started: nothing will ever be announced
    let discovery = Arc::new(Discovery::new(DiscoveryConfig::default()));
    let client = ResilientClient::new("Content", discovery, config(1)).unwrap();

    let start = Instant::now();
    assert_eq!(client.resolve().await, Err(CanonicalError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn unknown_scheme_is_not_implemented() {
    let lookup = Fixed(vec![Url::parse("carrier-pigeon://loft:1").unwrap()]);
    let client = ResilientClient::new("Image", lookup, config(3)).unwrap();

    let reply: std::result::Result<(), _> =
        client.call(&Operation::delete("images/1"), &()).await;

    assert_eq!(reply, Err(CanonicalError::NotImplemented));
}
