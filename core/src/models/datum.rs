//! Secondary index entry

use serde::{Serialize, Deserialize};

/// A datum uploaded under `(key, subKey)`
///
/// Stored at the composite key of the secondary index as a full copy; it is
/// independent of the primary record at `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedDatum {
    /// Primary key the datum belongs to
    pub key: String,

    /// Sub key within the primary key
    pub sub_key: String,

    /// Index tag, `"Subkey"` with the default configuration
    pub index: String,

    /// Caller-defined data type
    pub data_type: String,

    /// Upload time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Content hash supplied by the caller
    pub hash: String,
}
