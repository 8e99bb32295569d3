use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::announcement::ServiceAnnouncement;
use crate::registry::ServiceRegistry;

/// Receives every announcement on the group and records it.
///
/// No filtering by service name happens here; readers filter at query time.
/// This task is the only writer of the registry, including expiry sweeps.
pub(crate) struct Listener {
    socket: Arc<UdpSocket>,
    registry: Arc<ServiceRegistry>,
    ttl: Duration,
    sweep_interval: Duration,
    max_datagram_size: usize,
}

impl Listener {
    pub(crate) fn new(
        socket: Arc<UdpSocket>,
        registry: Arc<ServiceRegistry>,
        ttl: Duration,
        sweep_interval: Duration,
        max_datagram_size: usize,
    ) -> Self {
        Self {
            socket,
            registry,
            ttl,
            sweep_interval,
            max_datagram_size,
        }
    }

    pub(crate) async fn run(self, cancel: CancellationToken) {
        // One spare byte tells an oversized datagram apart from a full one
        let mut buf = vec![0u8; self.max_datagram_size + 1];
        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = sweep.tick() => {
                    let removed = self.registry.sweep(Instant::now(), self.ttl);
                    if removed > 0 {
                        debug!(removed, "expired endpoints purged");
                    }
                }

                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) if len > self.max_datagram_size => {
                        debug!(%peer, limit = self.max_datagram_size, "dropping oversized datagram");
                    }
                    Ok((len, peer)) => match ServiceAnnouncement::decode(&buf[..len]) {
                        Ok(announcement) => {
                            trace!(%peer, %announcement, "announcement received");
                            let (name, uri) = announcement.into_parts();
                            self.registry.upsert(&name, uri, Instant::now());
                        }
                        Err(e) => debug!(%peer, error = %e, "dropping datagram"),
                    },
                    Err(e) => {
                        warn!(error = %e, "discovery receive failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
            }
        }

        debug!("listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    struct Harness {
        registry: Arc<ServiceRegistry>,
        sender: UdpSocket,
        target: std::net::SocketAddr,
        cancel: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    async fn harness(ttl: Duration, sweep: Duration) -> Harness {
        harness_with_limit(ttl, sweep, 65_536).await
    }

    async fn harness_with_limit(ttl: Duration, sweep: Duration, max_datagram_size: usize) -> Harness {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let target = socket.local_addr().unwrap();
        let registry = Arc::new(ServiceRegistry::new());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            Listener::new(socket, registry.clone(), ttl, sweep, max_datagram_size)
                .run(cancel.clone()),
        );
        Harness {
            registry,
            sender: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
            target,
            cancel,
            task,
        }
    }

    #[tokio::test]
    async fn records_announcements_of_any_name() {
        let h = harness(Duration::from_secs(10), Duration::from_secs(5)).await;

        h.sender.send_to(b"Users\trpc://u:9000", h.target).await.unwrap();
        h.sender.send_to(b"Image\thttp://i:8080/rest", h.target).await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let users = h.registry.await_live("Users", 1, Duration::from_secs(10), deadline).await;
        let images = h.registry.await_live("Image", 1, Duration::from_secs(10), deadline).await;

        assert_eq!(users, vec![Url::parse("rpc://u:9000").unwrap()]);
        assert_eq!(images, vec![Url::parse("http://i:8080/rest").unwrap()]);
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn malformed_datagrams_are_dropped_and_listener_survives() {
        let h = harness(Duration::from_secs(10), Duration::from_secs(5)).await;

        h.sender.send_to(b"garbage-no-delimiter", h.target).await.unwrap();
        h.sender.send_to(b"a\tb\tc", h.target).await.unwrap();
        h.sender.send_to(&[0xc3, 0x28, b'\t'], h.target).await.unwrap();
        h.sender.send_to(b"Content\trpc://c:9000", h.target).await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let live = h.registry.await_live("Content", 1, Duration::from_secs(10), deadline).await;
        assert_eq!(live.len(), 1);

        assert_eq!(h.registry.service_names(), vec!["Content"]);
        assert!(h
            .registry
            .live_endpoints("garbage-no-delimiter", Instant::now(), Duration::from_secs(10))
            .is_empty());
        assert!(!h.task.is_finished());
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn oversized_datagram_is_dropped_not_truncated() {
        let h = harness_with_limit(Duration::from_secs(10), Duration::from_secs(5), 16).await;

        // 22 bytes; cut at 16 it would still parse as "rest://hos"
        h.sender.send_to(b"Users\trest://host:8080", h.target).await.unwrap();
        // exactly at the limit is accepted
        h.sender.send_to(b"Image\trpc://i:90", h.target).await.unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        let images = h.registry.await_live("Image", 1, Duration::from_secs(10), deadline).await;
        assert_eq!(images, vec![Url::parse("rpc://i:90").unwrap()]);

        assert!(h
            .registry
            .live_endpoints("Users", Instant::now(), Duration::from_secs(10))
            .is_empty());
        assert_eq!(h.registry.service_names(), vec!["Image"]);
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries() {
        let h = harness(Duration::from_millis(100), Duration::from_millis(20)).await;

        h.sender.send_to(b"Users\trpc://u:9000", h.target).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        assert_eq!(
            h.registry.await_live("Users", 1, Duration::from_millis(100), deadline).await.len(),
            1
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(h.registry.service_names().is_empty());
        h.cancel.cancel();
    }

    #[tokio::test]
    async fn cancel_stops_a_blocked_receive() {
        let h = harness(Duration::from_secs(10), Duration::from_secs(5)).await;
        h.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), h.task)
            .await
            .unwrap()
            .unwrap();
    }
}
