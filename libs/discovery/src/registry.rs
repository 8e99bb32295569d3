//! Soft-state table of discovered endpoints.
//!
//! Liveness is never stored: every read computes it against the `now` it is
//! given, so an entry silently stops being returned once it is `ttl` old.
//! Only the listener task writes here; everybody else reads.

use std::collections::HashMap;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

pub struct ServiceRegistry {
    services: DashMap<String, HashMap<Url, Instant>>,
    /// Bumped on every upsert; waiters re-check their predicate on change.
    changes: watch::Sender<u64>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            services: DashMap::new(),
            changes,
        }
    }

    /// Record that `uri` offered `name` at `now`.
    ///
    /// The timestamp only moves forward, so a delayed duplicate cannot age an
    /// entry that a newer announcement already refreshed.
    pub(crate) fn upsert(&self, name: &str, uri: Url, now: Instant) {
        {
            let mut endpoints = self.services.entry(name.to_string()).or_default();
            endpoints
                .entry(uri)
                .and_modify(|seen| *seen = (*seen).max(now))
                .or_insert(now);
        }
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Drop entries that are `ttl` old at `now`. Returns how many were removed.
    pub(crate) fn sweep(&self, now: Instant, ttl: Duration) -> usize {
        let mut removed = 0;
        self.services.retain(|_, endpoints| {
            let before = endpoints.len();
            endpoints.retain(|_, seen| is_live(*seen, now, ttl));
            removed += before - endpoints.len();
            !endpoints.is_empty()
        });
        removed
    }

    /// Endpoints of `name` seen less than `ttl` before `now`, sorted.
    pub fn live_endpoints(&self, name: &str, now: Instant, ttl: Duration) -> Vec<Url> {
        let mut live: Vec<Url> = self
            .services
            .get(name)
            .map(|endpoints| {
                endpoints
                    .iter()
                    .filter(|(_, seen)| is_live(**seen, now, ttl))
                    .map(|(uri, _)| uri.clone())
                    .collect()
            })
            .unwrap_or_default();
        live.sort();
        live
    }

    /// Wait until `name` has at least `min_count` live endpoints or
    /// `deadline` passes, then return whatever is live.
    ///
    /// Returning fewer than `min_count` on timeout is the degraded case,
    /// not an error.
    pub async fn await_live(
        &self,
        name: &str,
        min_count: usize,
        ttl: Duration,
        deadline: Instant,
    ) -> Vec<Url> {
        // Subscribe before the first check so an upsert racing with it still
        // marks the receiver as changed.
        let mut changes = self.changes.subscribe();

        loop {
            let live = self.live_endpoints(name, Instant::now(), ttl);
            if live.len() >= min_count {
                return live;
            }

            match tokio::time::timeout_at(deadline, changes.changed()).await {
                Ok(Ok(())) => continue,
                // Sender lives as long as self; treat closure like the deadline
                Ok(Err(_)) | Err(_) => return self.live_endpoints(name, Instant::now(), ttl),
            }
        }
    }

    /// Names with at least one stored entry, live or not.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

fn is_live(seen: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(seen) < ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(10);

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_live_until_ttl_elapses() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        registry.upsert("Users", uri("rest://host:8080"), t0);

        assert_eq!(
            registry.live_endpoints("Users", t0 + Duration::from_millis(9_999), TTL),
            vec![uri("rest://host:8080")]
        );
        assert!(registry.live_endpoints("Users", t0 + TTL, TTL).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_upsert_resurrects_expired_entry() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        registry.upsert("Users", uri("rest://host:8080"), t0);

        let later = t0 + Duration::from_secs(30);
        assert!(registry.live_endpoints("Users", later, TTL).is_empty());

        registry.upsert("Users", uri("rest://host:8080"), later);
        assert_eq!(registry.live_endpoints("Users", later, TTL).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_upserts_do_not_grow_the_set() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        for i in 0..50 {
            registry.upsert("Content", uri("rpc://a:9000"), t0 + Duration::from_millis(i));
            registry.upsert("Content", uri("rpc://b:9000"), t0 + Duration::from_millis(i));
        }

        let live = registry.live_endpoints("Content", t0 + Duration::from_secs(1), TTL);
        assert_eq!(live, vec![uri("rpc://a:9000"), uri("rpc://b:9000")]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_duplicate_does_not_move_last_seen_backwards() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        let fresh = t0 + Duration::from_secs(8);
        registry.upsert("Image", uri("http://img:80/rest"), fresh);
        // delayed packet stamped earlier
        registry.upsert("Image", uri("http://img:80/rest"), t0);

        let probe = t0 + Duration::from_secs(12);
        assert_eq!(registry.live_endpoints("Image", probe, TTL).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn names_are_kept_apart() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        registry.upsert("Users", uri("rpc://u:1"), t0);
        registry.upsert("Image", uri("rpc://i:1"), t0);

        assert_eq!(registry.live_endpoints("Users", t0, TTL), vec![uri("rpc://u:1")]);
        assert!(registry.live_endpoints("Content", t0, TTL).is_empty());
        assert_eq!(registry.service_names(), vec!["Image", "Users"]);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_purges_only_expired_entries() {
        let registry = ServiceRegistry::new();
        let t0 = Instant::now();
        registry.upsert("Users", uri("rpc://old:1"), t0);
        registry.upsert("Users", uri("rpc://new:1"), t0 + Duration::from_secs(6));
        registry.upsert("Image", uri("rpc://gone:1"), t0);

        let removed = registry.sweep(t0 + Duration::from_secs(11), TTL);
        assert_eq!(removed, 2);
        assert_eq!(registry.service_names(), vec!["Users"]);
        assert_eq!(
            registry.live_endpoints("Users", t0 + Duration::from_secs(11), TTL),
            vec![uri("rpc://new:1")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn await_live_returns_immediately_when_satisfied() {
        let registry = ServiceRegistry::new();
        registry.upsert("Users", uri("rpc://u:1"), Instant::now());

        let start = Instant::now();
        let live = registry
            .await_live("Users", 1, TTL, start + Duration::from_secs(5))
            .await;
        assert_eq!(live.len(), 1);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn await_live_gives_up_at_deadline_with_what_it_has() {
        let registry = ServiceRegistry::new();
        registry.upsert("Content", uri("rpc://c1:1"), Instant::now());

        let start = Instant::now();
        let live = registry
            .await_live("Content", 2, TTL, start + Duration::from_secs(3))
            .await;

        assert_eq!(live, vec![uri("rpc://c1:1")]);
        let waited = Instant::now() - start;
        assert!(waited >= Duration::from_secs(3));
        assert!(waited < Duration::from_millis(3_100));
    }

    #[tokio::test(start_paused = true)]
    async fn await_live_wakes_when_enough_endpoints_appear() {
        let registry = Arc::new(ServiceRegistry::new());
        registry.upsert("Content", uri("rpc://c1:1"), Instant::now());

        let writer = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            // unrelated name first: must not satisfy the waiter
            writer.upsert("Users", uri("rpc://u:1"), Instant::now());
            tokio::time::sleep(Duration::from_millis(200)).await;
            writer.upsert("Content", uri("rpc://c2:1"), Instant::now());
        });

        let start = Instant::now();
        let live = registry
            .await_live("Content", 2, TTL, start + Duration::from_secs(5))
            .await;

        assert_eq!(live, vec![uri("rpc://c1:1"), uri("rpc://c2:1")]);
        assert!(Instant::now() - start < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn await_live_with_zero_minimum_never_blocks() {
        let registry = ServiceRegistry::new();
        let start = Instant::now();
        let live = registry
            .await_live("Nobody", 0, TTL, start + Duration::from_secs(5))
            .await;
        assert!(live.is_empty());
        assert_eq!(Instant::now(), start);
    }
}
