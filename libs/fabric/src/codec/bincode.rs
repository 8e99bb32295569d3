use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::codec::Codec;
use crate::error::{Error, Result};

/// Bincode codec used for RPC envelopes and their payloads
///
/// Decoding is bounded so a hostile length field inside a frame cannot make
/// us allocate more than `limit` bytes.
#[derive(Debug, Clone, Copy)]
pub struct BincodeCodec {
    limit: u64,
}

impl BincodeCodec {
    pub const DEFAULT_LIMIT: u64 = crate::transport::MAX_FRAME_LEN as u64;

    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(self.limit)
    }
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

impl Codec for BincodeCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        self.options()
            .serialize(value)
            .map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        self.options()
            .deserialize(bytes)
            .map_err(|e| Error::Codec(e.to_string()))
    }
}
