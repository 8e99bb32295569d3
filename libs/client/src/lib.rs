//! Agora Client - resilient calls between services
//!
//! A [`ResilientClient`] names a logical service, finds a live endpoint
//! through discovery and calls it over the transport the endpoint's URI
//! scheme selects (`http(s)://` for REST, `rpc://` for the framed RPC
//! transport). Transport failures are retried with a fixed delay; answers
//! from the remote service, errors included, are returned as they are.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use agora_client::{ClientConfig, Operation, ResilientClient};
//! use agora_discovery::{Discovery, DiscoveryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = Arc::new(Discovery::new(DiscoveryConfig::default()));
//! discovery.start(None).await?;
//!
//! let users = ResilientClient::new("Users", discovery.clone(), ClientConfig::default())?;
//! let name: String = users
//!     .call(&Operation::get("users/alice"), &())
//!     .await
//!     .map_err(|code| format!("users said {code}"))?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod rest;
pub mod retry;
pub mod rpc;
pub mod strategy;

pub use client::{ResilientClient, TransportKind};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use lookup::Lookup;
pub use retry::RetryBudget;
pub use strategy::{CallStrategy, Method, Operation, Verdict};
