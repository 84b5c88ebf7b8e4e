//! Primary record representation

use serde::{Serialize, Deserialize};

/// A registered device record, stored at world-state key `key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Business identifier, also the world-state key
    pub key: String,

    /// Sub key assigned at registration
    pub sub_key: String,

    /// Id of the transaction that registered the record
    pub hash: String,

    /// Registration time in milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Record {
    /// Create a new record
    pub fn new(key: &str, sub_key: &str, hash: &str, timestamp: i64) -> Self {
        Record {
            key: key.to_string(),
            sub_key: sub_key.to_string(),
            hash: hash.to_string(),
            timestamp,
        }
    }
}
