use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::announcement::ServiceAnnouncement;

/// Periodically multicasts this process's own announcement.
///
/// Announcing is soft state: a failed send is logged and the next tick simply
/// tries again.
pub(crate) struct Announcer {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    announcement: ServiceAnnouncement,
    period: Duration,
}

impl Announcer {
    pub(crate) fn new(
        socket: Arc<UdpSocket>,
        target: SocketAddr,
        announcement: ServiceAnnouncement,
        period: Duration,
    ) -> Self {
        Self {
            socket,
            target,
            announcement,
            period,
        }
    }

    pub(crate) async fn run(self, cancel: CancellationToken) {
        info!(
            service = self.announcement.name(),
            uri = %self.announcement.uri(),
            group = %self.target,
            "announcing"
        );

        let datagram = self.announcement.encode();
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Cancellation must not wait for a stuck send
            let sent = tokio::select! {
                _ = cancel.cancelled() => break,
                sent = self.socket.send_to(&datagram, self.target) => sent,
            };

            match sent {
                Ok(_) => debug!(service = self.announcement.name(), "announcement sent"),
                Err(e) => warn!(
                    service = self.announcement.name(),
                    error = %e,
                    "announcement send failed"
                ),
            }
        }

        debug!(service = self.announcement.name(), "announcer stopped");
    }
}
