//! Agora Discovery - multicast presence gossip
//!
//! Every service process periodically multicasts `<name>\t<uri>` on a shared
//! group and listens for everybody else's announcements. What it hears is kept
//! as soft state: an endpoint is reported only while its last announcement is
//! younger than the TTL, so a process that stops announcing simply fades out.
//!
//! # Example
//!
//! ```no_run
//! use agora_discovery::{Discovery, DiscoveryConfig, ServiceAnnouncement};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = Discovery::new(DiscoveryConfig::default());
//! let me = ServiceAnnouncement::new("Content", "rpc://10.0.0.5:9000")?;
//! discovery.start(Some(me)).await?;
//!
//! let users = discovery.lookup("Users", 1, Duration::from_secs(5)).await;
//! # Ok(())
//! # }
//! ```

pub mod announcement;
pub mod config;
pub mod discovery;
pub mod error;
pub mod interface;
pub mod multicast;
pub mod registry;

mod announcer;
mod listener;

pub use announcement::ServiceAnnouncement;
pub use config::DiscoveryConfig;
pub use discovery::Discovery;
pub use error::{Error, Result};
pub use registry::ServiceRegistry;
