use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use url::Url;

use crate::announcement::ServiceAnnouncement;
use crate::announcer::Announcer;
use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::interface;
use crate::listener::Listener;
use crate::multicast;
use crate::registry::ServiceRegistry;

/// Process-wide discovery handle.
///
/// Constructed once at startup and passed to whatever needs lookups. Owns
/// the multicast socket, at most one announcer and exactly one listener.
pub struct Discovery {
    config: DiscoveryConfig,
    registry: Arc<ServiceRegistry>,
    running: OnceCell<Running>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

struct Running {
    interface: Ipv4Addr,
    announcement: Option<ServiceAnnouncement>,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ServiceRegistry::new()),
            running: OnceCell::new(),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Build from `AGORA_DISCOVERY_*` settings.
    pub fn from_settings() -> Result<Self> {
        Ok(Self::new(DiscoveryConfig::from_settings()?))
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Read-only view of what has been discovered so far.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Join the group and start the background tasks.
    ///
    /// Pass an announcement if this process offers a service. Calling this
    /// again is a no-op: the tasks started by the first successful call keep
    /// running and a different announcement is ignored with a warning.
    ///
    /// Shutdown is terminal; starting afterwards fails with
    /// [`Error::ShutDown`](crate::Error::ShutDown).
    pub async fn start(&self, announcement: Option<ServiceAnnouncement>) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShutDown);
        }

        let running = self
            .running
            .get_or_try_init(|| self.launch(announcement.clone()))
            .await?;

        if announcement.is_some() && running.announcement != announcement {
            warn!(
                requested = ?announcement,
                active = ?running.announcement,
                "discovery already started, keeping the original announcement"
            );
        }
        Ok(())
    }

    async fn launch(&self, announcement: Option<ServiceAnnouncement>) -> Result<Running> {
        self.config.validate()?;
        let chosen = interface::resolve(self.config.interface)?;
        let socket = Arc::new(multicast::open(
            self.config.group,
            chosen.addr,
            self.config.multicast_ttl,
        )?);

        info!(
            group = %self.config.group,
            interface = %chosen.name,
            addr = %chosen.addr,
            "joined discovery group"
        );

        if let Some(announcement) = &announcement {
            let announcer = Announcer::new(
                socket.clone(),
                SocketAddr::V4(self.config.group),
                announcement.clone(),
                self.config.announce_period(),
            );
            self.tasks.spawn(announcer.run(self.cancel.clone()));
        }

        let listener = Listener::new(
            socket,
            self.registry.clone(),
            self.config.ttl(),
            self.config.sweep_interval(),
            self.config.max_datagram_size,
        );
        self.tasks.spawn(listener.run(self.cancel.clone()));

        Ok(Running {
            interface: chosen.addr,
            announcement,
        })
    }

    pub fn is_started(&self) -> bool {
        self.running.initialized()
    }

    /// Background tasks still running: the listener, plus the announcer
    /// when this process offers a service.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Address of the interface the group was joined on, once started.
    pub fn interface(&self) -> Option<Ipv4Addr> {
        self.running.get().map(|running| running.interface)
    }

    /// Wait up to `timeout` for at least `min_replies` live endpoints of
    /// `service`, then return whatever is live (possibly fewer).
    pub async fn lookup(&self, service: &str, min_replies: usize, timeout: Duration) -> Vec<Url> {
        let deadline = Instant::now() + timeout;
        self.registry
            .await_live(service, min_replies, self.config.ttl(), deadline)
            .await
    }

    /// Live endpoints of `service` right now, without waiting.
    pub fn known_uris(&self, service: &str) -> Vec<Url> {
        self.registry
            .live_endpoints(service, Instant::now(), self.config.ttl())
    }

    /// Stop announcing and listening.
    ///
    /// In-flight socket operations are abandoned rather than awaited.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        info!("discovery stopped");
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
