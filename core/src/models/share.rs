//! Share request representation

use serde::{Serialize, Deserialize};

/// Request from `Viewer` to see `ShareFields` of `Owner`'s data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Owner of the data
    #[serde(rename = "Owner")]
    pub owner: String,

    /// Request time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Party asking for access
    #[serde(rename = "Viewer")]
    pub viewer: String,

    /// Data type the request applies to
    #[serde(rename = "dataType")]
    pub data_type: String,

    /// Fields to share
    #[serde(rename = "ShareFields", default)]
    pub share_fields: Vec<String>,
}
