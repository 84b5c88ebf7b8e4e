//! Error types for the peer service

use std::net::AddrParseError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use meddata_core::CoreError;
use serde_json::json;
use thiserror::Error;

/// Result type for the peer
pub type Result<T> = std::result::Result<T, PeerError>;

/// Error type for the peer
#[derive(Debug, Error)]
pub enum PeerError {
    /// The invocation failed in the ledger
    #[error(transparent)]
    Ledger(#[from] CoreError),

    /// Request addressed a channel this peer does not host
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// Request addressed a chaincode this peer does not host
    #[error("Unknown chaincode: {0}")]
    UnknownChaincode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration source error
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Address parsing error
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] AddrParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PeerError {
    /// Stable name of the error kind, reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            PeerError::Ledger(err) => err.kind(),
            PeerError::UnknownChannel(_) => "UnknownChannel",
            PeerError::UnknownChaincode(_) => "UnknownChaincode",
            PeerError::Config(_) | PeerError::ConfigSource(_) => "Config",
            PeerError::AddrParse(_) => "AddrParse",
            PeerError::Io(_) => "Io",
        }
    }

    /// HTTP status reported for this error
    pub fn status(&self) -> StatusCode {
        match self {
            PeerError::Ledger(CoreError::InvalidArgument(_)) | PeerError::Ledger(CoreError::UnknownFunction(_)) => {
                StatusCode::BAD_REQUEST
            }
            PeerError::Ledger(CoreError::NotFound(_))
            | PeerError::UnknownChannel(_)
            | PeerError::UnknownChaincode(_) => StatusCode::NOT_FOUND,
            PeerError::Ledger(CoreError::CommitConflict(_)) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PeerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        let body = json!({ "error": self.to_string(), "kind": self.kind() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CoreError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::UnknownFunction("x".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::NotFound("x".into()), StatusCode::NOT_FOUND)]
    #[case(CoreError::CommitConflict("x".into()), StatusCode::CONFLICT)]
    #[case(CoreError::Corrupted("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(CoreError::Stub("x".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_ledger_error_status(#[case] err: CoreError, #[case] expected: StatusCode) {
        assert_eq!(PeerError::from(err).status(), expected);
    }

    #[test]
    fn test_unknown_target_is_not_found() {
        let err = PeerError::UnknownChaincode("other".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "UnknownChaincode");
    }

    #[test]
    fn test_ledger_message_is_passed_through() {
        let inner = CoreError::CommitConflict("read of dev-1".to_string());
        let expected = inner.to_string();
        let err = PeerError::from(inner);
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.kind(), "CommitConflict");
    }
}
