//! Index history and per-key version history

use std::sync::Arc;

use log::debug;
use serde_json::json;

use crate::config::CoreConfig;
use crate::error::{required, Result};
use crate::models::{HistoryEntry, KeyedRecord};
use crate::stub::ChaincodeStub;

use super::collector::ResultCollector;

/// Retrieval of every index entry of a key and of a key's modification log
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    config: Arc<CoreConfig>,
}

impl HistoryTracker {
    /// Create a history tracker
    pub fn new(config: Arc<CoreConfig>) -> Self {
        HistoryTracker { config }
    }

    /// Every `(key, subKey)` index entry of `key`, in composite-key order
    pub fn get_history(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<Vec<KeyedRecord>> {
        if key.is_empty() {
            return Err(required("key"));
        }

        debug!("Scanning index {} for {}", self.config.index.name, key);
        let cursor = stub.get_state_by_partial_composite_key(&self.config.index.name, &[key])?;
        ResultCollector::collect_records(cursor)
    }

    /// Index entries of `key` uploaded with `data_type`
    pub fn get_history_by_data_type(
        &self,
        stub: &mut dyn ChaincodeStub,
        key: &str,
        data_type: &str,
    ) -> Result<Vec<KeyedRecord>> {
        if key.is_empty() {
            return Err(required("key"));
        }
        if data_type.is_empty() {
            return Err(required("dataType"));
        }

        let query = json!({
            "selector": {
                "key": key,
                "index": self.config.index.tag,
                "dataType": data_type,
            }
        })
        .to_string();

        let cursor = stub.get_query_result(&query)?;
        ResultCollector::collect_records(cursor)
    }

    /// Modification history of the value stored at `key`, newest first
    pub fn get_key_history(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<Vec<HistoryEntry>> {
        if key.is_empty() {
            return Err(required("key"));
        }

        let cursor = stub.get_history_for_key(key)?;
        ResultCollector::collect_history(cursor)
    }
}
