//! Agora Core - types shared by every service crate
//!
//! Holds the canonical error taxonomy and the status mappers for both
//! transports, plus the ambient configuration and logging helpers.

pub mod config;
pub mod error;
pub mod logging;
pub mod status;

pub use error::{Error, Result};
pub use status::{CanonicalError, RpcCode};
