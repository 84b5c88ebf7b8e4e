//! Response payloads returned across the invocation boundary

use serde::{Serialize, Deserialize};

/// Outcome of a register call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterOutcome {
    /// The key was already registered; nothing was written
    Exists,

    /// A new record was written
    Success,
}

/// Response of `register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Whether the record was created or already present
    pub result: RegisterOutcome,

    /// Hash of the (existing or new) record
    pub hash: String,
}

/// Response of `uploadData`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always true on success
    pub result: bool,

    /// Human readable summary
    pub message: String,
}

/// Response of `checkBySubkey`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    /// Whether an entry exists for the pair
    pub result: bool,

    /// Hash of the entry, when it exists and is readable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Response of `delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Always true on success
    pub result: bool,
}

/// One entry of a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRecord {
    /// World-state key of the entry
    #[serde(rename = "Key")]
    pub key: String,

    /// Decoded payload, or the raw payload as a string when it is not JSON
    #[serde(rename = "Record")]
    pub record: serde_json::Value,
}

/// One modification from the history of a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction that made the modification
    #[serde(rename = "TxId")]
    pub tx_id: String,

    /// Commit time in milliseconds since the Unix epoch
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,

    /// Whether the modification was a delete
    #[serde(rename = "IsDelete")]
    pub is_delete: bool,

    /// Decoded value, or the raw value as a string when it is not JSON
    #[serde(rename = "Value")]
    pub value: serde_json::Value,
}

/// A page of a paginated rich query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Entries of this page
    pub result: Vec<KeyedRecord>,

    /// Bookmark of the next page, empty when there is none
    pub bookmark: String,
}

/// Pagination metadata of a range page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Entries fetched in this page
    #[serde(rename = "RecordsCount")]
    pub records_count: u32,

    /// Bookmark of the next page, empty when there is none
    #[serde(rename = "Bookmark")]
    pub bookmark: String,
}

/// A page of a paginated range scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePage {
    /// Entries of this page
    pub result: Vec<KeyedRecord>,

    /// Pagination metadata
    #[serde(rename = "ResponseMetadata")]
    pub metadata: ResponseMetadata,
}
