//! Wire format of a presence announcement.
//!
//! One datagram, ASCII text: `<name>\t<uri>`. There is no
//! escaping, so neither field may contain the delimiter; that is enforced
//! when an announcement is built rather than repaired on receipt.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

pub const DELIMITER: char = '\t';

/// A service name and the URI it is reachable at, as carried on the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceAnnouncement {
    name: String,
    uri: Url,
}

fn forbidden(c: char) -> bool {
    c == DELIMITER || c == '\r' || c == '\n'
}

impl ServiceAnnouncement {
    /// Validate and build an announcement for this process.
    pub fn new(name: impl Into<String>, uri: &str) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidAnnouncement("empty service name".into()));
        }
        if name.contains(forbidden) {
            return Err(Error::InvalidAnnouncement(format!(
                "service name {name:?} contains a delimiter or line break"
            )));
        }
        // Url::parse silently strips tabs and newlines, so check the raw text
        if uri.contains(forbidden) {
            return Err(Error::InvalidAnnouncement(format!(
                "service uri {uri:?} contains a delimiter or line break"
            )));
        }
        let uri = Url::parse(uri)
            .map_err(|e| Error::InvalidAnnouncement(format!("service uri {uri:?}: {e}")))?;

        Ok(Self { name, uri })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn into_parts(self) -> (String, Url) {
        (self.name, self.uri)
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Parse a received datagram.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| Error::MalformedAnnouncement("not valid UTF-8".into()))?;

        let mut fields = text.split(DELIMITER);
        let (name, uri) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(uri), None) => (name, uri),
            _ => {
                return Err(Error::MalformedAnnouncement(format!(
                    "expected 2 fields in {text:?}"
                )))
            }
        };

        Self::new(name, uri).map_err(|e| match e {
            Error::InvalidAnnouncement(msg) => Error::MalformedAnnouncement(msg),
            other => other,
        })
    }
}

impl fmt::Display for ServiceAnnouncement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, DELIMITER, self.uri)
    }
}
