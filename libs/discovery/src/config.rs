use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment prefix, e.g. `AGORA_DISCOVERY_TTL_MS=5000`
pub const ENV_PREFIX: &str = "AGORA_DISCOVERY_";

pub const DEFAULT_GROUP: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(226, 226, 226, 226), 2262);
pub const DEFAULT_ANNOUNCE_PERIOD_MS: u64 = 1_000;
pub const DEFAULT_TTL_MS: u64 = 10_000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Multicast group shared by every participating process
    pub group: SocketAddrV4,

    /// Join the group on this local address instead of auto-selecting
    pub interface: Option<Ipv4Addr>,

    pub announce_period_ms: u64,

    /// Age at which an endpoint stops being reported
    pub ttl_ms: u64,

    pub sweep_interval_ms: u64,

    pub max_datagram_size: usize,

    /// IP hop limit of outgoing announcements
    pub multicast_ttl: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP,
            interface: None,
            announce_period_ms: DEFAULT_ANNOUNCE_PERIOD_MS,
            ttl_ms: DEFAULT_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
            multicast_ttl: 1,
        }
    }
}

impl DiscoveryConfig {
    /// Defaults overridden by `AGORA_DISCOVERY_*` variables, validated.
    pub fn from_settings() -> Result<Self> {
        let config: Self = agora_core::config::from_env(ENV_PREFIX)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.group.ip().is_multicast() {
            return Err(Error::InvalidGroup(self.group));
        }
        if self.announce_period_ms == 0 {
            return Err(agora_core::Error::config("announce_period_ms must be positive").into());
        }
        if self.announce_period_ms >= self.ttl_ms {
            return Err(agora_core::Error::config(format!(
                "announce_period_ms ({}) must be shorter than ttl_ms ({})",
                self.announce_period_ms, self.ttl_ms
            ))
            .into());
        }
        if self.sweep_interval_ms == 0 || self.max_datagram_size == 0 {
            return Err(agora_core::Error::config(
                "sweep_interval_ms and max_datagram_size must be positive",
            )
            .into());
        }
        Ok(())
    }

    pub fn with_group(mut self, group: SocketAddrV4) -> Self {
        self.group = group;
        self
    }

    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    pub fn with_announce_period(mut self, period: Duration) -> Self {
        self.announce_period_ms = agora_core::config::duration_ms(period);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = agora_core::config::duration_ms(ttl);
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = agora_core::config::duration_ms(interval);
        self
    }

    pub fn announce_period(&self) -> Duration {
        Duration::from_millis(self.announce_period_ms)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
