//! Agora Fabric - framed transport and RPC layer
//!
//! Provides a length-prefixed TCP transport, a bounded bincode codec and the
//! RPC envelope used by the `rpc://` transport between services.
//!
//! # Example
//!
//! ```no_run
//! use agora_fabric::rpc::{self, RpcRequest, RpcResponse};
//! use agora_fabric::transport::Dialer;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = RpcRequest::new("GET users/alice", &())?;
//! let dialer = Dialer::new("127.0.0.1:9000".parse()?)
//!     .connect_timeout(Duration::from_secs(1))
//!     .io_timeout(Duration::from_secs(5));
//! let reply: RpcResponse = rpc::invoke(&dialer, &request).await?;
//! let name: String = reply.decode()?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod rpc;
pub mod transport;

pub use channel::Channel;
pub use error::{Error, Result, Stage};
