//! Canonical error taxonomy shared by every transport.
//!
//! Both transports report outcomes in their own status space: the REST
//! transport uses HTTP status codes, the RPC transport uses [`RpcCode`].
//! Callers only ever see a [`CanonicalError`], so business code never has to
//! know which wire protocol answered. Every mapping here is total: a status
//! that is not explicitly recognized becomes [`CanonicalError::InternalError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-independent outcome of a cross-service call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalError {
    #[error("ok")]
    Ok,

    #[error("bad request")]
    BadRequest,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("not implemented")]
    NotImplemented,

    #[error("internal error")]
    InternalError,

    #[error("timeout")]
    Timeout,
}

impl CanonicalError {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Translate an HTTP status code.
    pub fn from_http(status: u16) -> Self {
        match status {
            200..=299 => Self::Ok,
            400 => Self::BadRequest,
            401 | 403 => Self::Forbidden,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            409 => Self::Conflict,
            501 => Self::NotImplemented,
            _ => Self::InternalError,
        }
    }

    /// HTTP status code a server should answer with for this outcome.
    pub fn to_http(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::NotImplemented => 501,
            Self::InternalError => 500,
            Self::Timeout => 504,
        }
    }

    /// Translate a status reported by the RPC transport.
    pub fn from_rpc(code: RpcCode) -> Self {
        match code {
            RpcCode::Ok => Self::Ok,
            RpcCode::InvalidArgument => Self::BadRequest,
            RpcCode::PermissionDenied | RpcCode::Unauthenticated => Self::Forbidden,
            RpcCode::NotFound => Self::NotFound,
            RpcCode::AlreadyExists => Self::Conflict,
            RpcCode::Unimplemented => Self::NotImplemented,
            RpcCode::DeadlineExceeded => Self::Timeout,
            RpcCode::Cancelled
            | RpcCode::Unknown
            | RpcCode::ResourceExhausted
            | RpcCode::FailedPrecondition
            | RpcCode::Aborted
            | RpcCode::OutOfRange
            | RpcCode::Internal
            | RpcCode::Unavailable
            | RpcCode::DataLoss => Self::InternalError,
        }
    }

    /// RPC status a server should answer with for this outcome.
    pub fn to_rpc(self) -> RpcCode {
        match self {
            Self::Ok => RpcCode::Ok,
            Self::BadRequest => RpcCode::InvalidArgument,
            Self::Forbidden => RpcCode::PermissionDenied,
            Self::NotFound => RpcCode::NotFound,
            Self::Conflict => RpcCode::AlreadyExists,
            Self::NotImplemented => RpcCode::Unimplemented,
            Self::InternalError => RpcCode::Internal,
            Self::Timeout => RpcCode::DeadlineExceeded,
        }
    }

    /// `Ok(())` for [`CanonicalError::Ok`], otherwise the error itself.
    pub fn into_result(self) -> Result<(), CanonicalError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Status codes carried in RPC reply envelopes.
///
/// Numbering follows the gRPC status code set so that operators reading
/// logs see familiar values. On the wire a code is its plain `u32` number; a
/// number outside the set reads back as [`RpcCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", from = "u32")]
#[repr(u8)]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcCode {
    pub fn from_u32(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|known| u32::from(*known) == code)
    }

    pub const ALL: [RpcCode; 17] = [
        RpcCode::Ok,
        RpcCode::Cancelled,
        RpcCode::Unknown,
        RpcCode::InvalidArgument,
        RpcCode::DeadlineExceeded,
        RpcCode::NotFound,
        RpcCode::AlreadyExists,
        RpcCode::PermissionDenied,
        RpcCode::ResourceExhausted,
        RpcCode::FailedPrecondition,
        RpcCode::Aborted,
        RpcCode::OutOfRange,
        RpcCode::Unimplemented,
        RpcCode::Internal,
        RpcCode::Unavailable,
        RpcCode::DataLoss,
        RpcCode::Unauthenticated,
    ];
}

impl From<RpcCode> for u32 {
    fn from(code: RpcCode) -> Self {
        code as u32
    }
}

impl From<u32> for RpcCode {
    fn from(code: u32) -> Self {
        Self::from_u32(code).unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [CanonicalError; 8] = [
        CanonicalError::Ok,
        CanonicalError::BadRequest,
        CanonicalError::Forbidden,
        CanonicalError::NotFound,
        CanonicalError::Conflict,
        CanonicalError::NotImplemented,
        CanonicalError::InternalError,
        CanonicalError::Timeout,
    ];

    #[test]
    fn every_canonical_value_survives_http() {
        for code in CANONICAL {
            assert_eq!(CanonicalError::from_http(code.to_http()), code);
        }
    }

    #[test]
    fn every_canonical_value_survives_rpc() {
        for code in CANONICAL {
            assert_eq!(CanonicalError::from_rpc(code.to_rpc()), code);
        }
    }

    #[test]
    fn http_success_range_is_ok() {
        assert_eq!(CanonicalError::from_http(200), CanonicalError::Ok);
        assert_eq!(CanonicalError::from_http(204), CanonicalError::Ok);
        assert_eq!(CanonicalError::from_http(299), CanonicalError::Ok);
    }

    #[test]
    fn unrecognized_http_status_is_internal() {
        for status in [0, 100, 302, 418, 429, 502, 503, 999] {
            assert_eq!(
                CanonicalError::from_http(status),
                CanonicalError::InternalError,
                "status {status}"
            );
        }
    }

    #[test]
    fn http_auth_failures_are_forbidden() {
        assert_eq!(CanonicalError::from_http(401), CanonicalError::Forbidden);
        assert_eq!(CanonicalError::from_http(403), CanonicalError::Forbidden);
    }

    #[test]
    fn rpc_mapping_covers_all_codes() {
        let internal = RpcCode::ALL
            .iter()
            .filter(|code| CanonicalError::from_rpc(**code) == CanonicalError::InternalError)
            .count();
        // Internal plus the eight codes with no canonical counterpart
        assert_eq!(internal, 9);
        assert_eq!(
            CanonicalError::from_rpc(RpcCode::AlreadyExists),
            CanonicalError::Conflict
        );
        assert_eq!(
            CanonicalError::from_rpc(RpcCode::Unauthenticated),
            CanonicalError::Forbidden
        );
    }

    #[test]
    fn into_result_only_passes_ok() {
        assert!(CanonicalError::Ok.into_result().is_ok());
        assert_eq!(
            CanonicalError::Conflict.into_result(),
            Err(CanonicalError::Conflict)
        );
    }

    #[test]
    fn wire_numbers_match_grpc() {
        for code in RpcCode::ALL {
            assert_eq!(RpcCode::from_u32(u32::from(code)), Some(code));
        }
        assert_eq!(u32::from(RpcCode::NotFound), 5);
        assert_eq!(u32::from(RpcCode::Unauthenticated), 16);
    }

    #[test]
    fn unrecognized_rpc_number_is_internal() {
        for raw in [17, 20, 255, u32::MAX] {
            assert_eq!(RpcCode::from_u32(raw), None);
            assert_eq!(RpcCode::from(raw), RpcCode::Unknown);
            assert_eq!(
                CanonicalError::from_rpc(RpcCode::from(raw)),
                CanonicalError::InternalError
            );
        }
    }
}
