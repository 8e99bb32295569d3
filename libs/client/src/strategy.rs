//! The seam between the retry loop and a concrete wire protocol.

use std::fmt;

use agora_core::CanonicalError;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to invoke on the remote service, independent of transport.
///
/// REST joins `path` onto the endpoint URI; RPC sends [`Operation::route`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    pub method: Method,
    pub path: String,
}

impl Operation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// `"<METHOD> <path>"`, with surrounding slashes trimmed from the path
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path.trim_matches('/'))
    }
}

/// Outcome class of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The remote never answered at the application level; try again.
    Retry,
    /// Final answer; surface it to the caller.
    Fail(CanonicalError),
}

/// One wire protocol: how to perform a single attempt and how to classify
/// its failures.
#[async_trait::async_trait]
pub trait CallStrategy: Send + Sync {
    async fn attempt<Req, Res>(
        &self,
        endpoint: &Url,
        operation: &Operation,
        request: &Req,
    ) -> Result<Res>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned + Send;

    fn classify(&self, error: &Error) -> Verdict {
        error.verdict()
    }
}
