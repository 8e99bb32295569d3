use agora_core::CanonicalError;
use thiserror::Error;
use url::Url;

use crate::strategy::Verdict;

/// Why a single attempt did not produce a value.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Fabric(#[from] agora_fabric::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Could not encode request: {0}")]
    Encode(String),

    #[error("Unusable endpoint {0}: {1}")]
    InvalidEndpoint(Url, String),

    #[error("Remote answered {0}")]
    Rejected(CanonicalError),
}

impl Error {
    /// Transport-layer failures are retried; anything the remote (or our own
    /// encoder) decided is final.
    pub fn verdict(&self) -> Verdict {
        match self {
            Self::Fabric(_) | Self::MalformedResponse(_) => Verdict::Retry,
            Self::Http(e) if e.is_builder() => Verdict::Fail(CanonicalError::BadRequest),
            Self::Http(_) => Verdict::Retry,
            Self::Encode(_) => Verdict::Fail(CanonicalError::BadRequest),
            Self::InvalidEndpoint(..) => Verdict::Fail(CanonicalError::InternalError),
            Self::Rejected(code) => Verdict::Fail(*code),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
