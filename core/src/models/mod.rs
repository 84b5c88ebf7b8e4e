//! Data models for the MedData contracts
//!
//! This module provides the entities stored in the world state and the JSON
//! response payloads returned across the invocation boundary. Field names are
//! part of the wire contract with existing callers.

mod record;
mod datum;
mod share;
mod task;
mod response;

pub use record::Record;
pub use datum::IndexedDatum;
pub use share::ShareRequest;
pub use task::Task;
pub use response::{
    CheckResponse, DeleteResponse, HistoryEntry, KeyedRecord, Page, RangePage,
    RegisterOutcome, RegisterResponse, ResponseMetadata, UploadResponse,
};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{to_decode_error, Result};

/// Document type constants
pub mod doc_types {
    /// `docType` of task entities
    pub const TASK: &str = "assert";
}

/// Serialize an entity or response into the bytes stored or returned
pub fn to_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a stored payload into a typed entity
///
/// Fails with `DecodeFailure`; callers decide whether that is fatal.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(to_decode_error)
}
