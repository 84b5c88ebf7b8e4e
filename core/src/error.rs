//! Error types for the core crate
//!
//! This module provides the consolidated error type raised by the contracts,
//! the world-state primitives and the registry.

use thiserror::Error;
use std::io;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required argument is missing, empty or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Point lookup on an absent key or composite key
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored entity disagrees with the key it was read from
    #[error("Corrupted state: {0}")]
    Corrupted(String),

    /// A stored payload could not be decoded
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// The read set changed between simulation and commit
    #[error("Commit conflict: {0}")]
    CommitConflict(String),

    /// No contract or operation is registered under the requested name
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// World-state primitive or cursor failure
    #[error("Stub error: {0}")]
    Stub(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Short, stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::InvalidArgument(_) => "InvalidArgument",
            CoreError::NotFound(_) => "NotFound",
            CoreError::Corrupted(_) => "Corrupted",
            CoreError::DecodeFailure(_) => "DecodeFailure",
            CoreError::CommitConflict(_) => "CommitConflict",
            CoreError::UnknownFunction(_) => "UnknownFunction",
            CoreError::Stub(_) => "Stub",
            CoreError::Config(_) => "Config",
            CoreError::Json(_) => "Json",
            CoreError::Io(_) => "Io",
        }
    }
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;

/// Build an InvalidArgument error for a missing required field
pub fn required(field: &str) -> CoreError {
    CoreError::InvalidArgument(format!("{} is required", field))
}

/// Convert a string error to a Stub error
pub fn to_stub_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::Stub(err.to_string())
}

/// Convert a string error to a ConfigError
pub fn to_config_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::Config(err.to_string())
}

/// Convert a string error to a DecodeFailure
pub fn to_decode_error<E: std::fmt::Display>(err: E) -> CoreError {
    CoreError::DecodeFailure(err.to_string())
}
