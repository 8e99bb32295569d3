use std::sync::Arc;
use std::time::Duration;

use agora_discovery::Discovery;
use url::Url;

/// Where the client finds endpoints for a logical service name.
#[async_trait::async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, service: &str, min_replies: usize, timeout: Duration) -> Vec<Url>;
}

#[async_trait::async_trait]
impl Lookup for Discovery {
    async fn lookup(&self, service: &str, min_replies: usize, timeout: Duration) -> Vec<Url> {
        Discovery::lookup(self, service, min_replies, timeout).await
    }
}

#[async_trait::async_trait]
impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    async fn lookup(&self, service: &str, min_replies: usize, timeout: Duration) -> Vec<Url> {
        (**self).lookup(service, min_replies, timeout).await
    }
}
