//! Secondary `(key, subKey)` index
//!
//! Data uploaded for a key is stored at the composite key
//! `(index.name, [key, subKey])`, a full copy per entry. The world state has
//! no in-place secondary indexes, so prefix scans over the composite namespace
//! are how the entries of one key are found again.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::{required, CoreError, Result};
use crate::models::{self, CheckResponse, IndexedDatum, UploadResponse};
use crate::stub::ChaincodeStub;

use super::args::UploadParams;

/// Composite-key index of uploaded data
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    config: Arc<CoreConfig>,
}

impl SecondaryIndex {
    /// Create an index handle
    pub fn new(config: Arc<CoreConfig>) -> Self {
        SecondaryIndex { config }
    }

    /// Object type of the index's composite keys
    pub fn name(&self) -> &str {
        &self.config.index.name
    }

    /// Composite key of the `(key, sub_key)` entry
    pub fn entry_key(&self, stub: &dyn ChaincodeStub, key: &str, sub_key: &str) -> Result<String> {
        stub.create_composite_key(self.name(), &[key, sub_key])
    }

    /// Write a datum under `(key, subKey)`, replacing any previous entry
    pub fn upload(&self, stub: &mut dyn ChaincodeStub, params: UploadParams) -> Result<UploadResponse> {
        for (value, field) in [
            (&params.key, "key"),
            (&params.sub_key, "subKey"),
            (&params.data_type, "dataType"),
            (&params.hash, "hash"),
        ] {
            if value.is_empty() {
                return Err(required(field));
            }
        }

        let entry_key = self.entry_key(stub, &params.key, &params.sub_key)?;
        let message = format!("uploadData - key= {} - {} : Successful", params.key, params.sub_key);
        let datum = IndexedDatum {
            key: params.key,
            sub_key: params.sub_key,
            index: self.config.index.tag.clone(),
            data_type: params.data_type,
            timestamp: stub.tx_timestamp(),
            hash: params.hash,
        };
        stub.put_state(&entry_key, models::to_payload(&datum)?)?;

        info!("Indexed {}/{} ({})", datum.key, datum.sub_key, datum.data_type);
        Ok(UploadResponse { result: true, message })
    }

    /// The datum stored under `(key, subKey)`
    pub fn query_by_subkey(&self, stub: &mut dyn ChaincodeStub, key: &str, sub_key: &str) -> Result<IndexedDatum> {
        let entry_key = self.checked_entry_key(stub, key, sub_key)?;

        match stub.get_state(&entry_key)? {
            Some(bytes) if !bytes.is_empty() => models::decode(&bytes).map_err(|e| {
                CoreError::Corrupted(format!("index entry {}/{} is not a datum: {}", key, sub_key, e))
            }),
            _ => Err(CoreError::NotFound(format!("key/subKey does not exist: {}/{}", key, sub_key))),
        }
    }

    /// Whether `(key, subKey)` is set, with its hash when readable
    pub fn check_by_subkey(&self, stub: &mut dyn ChaincodeStub, key: &str, sub_key: &str) -> Result<CheckResponse> {
        let entry_key = self.checked_entry_key(stub, key, sub_key)?;

        let bytes = match stub.get_state(&entry_key)? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                debug!("No index entry for {}/{}", key, sub_key);
                return Ok(CheckResponse { result: false, hash: None });
            }
        };

        let hash = match models::decode::<IndexedDatum>(&bytes) {
            Ok(datum) => Some(datum.hash),
            Err(e) => {
                warn!("Index entry {}/{} is set but unreadable: {}", key, sub_key, e);
                None
            }
        };
        Ok(CheckResponse { result: true, hash })
    }

    fn checked_entry_key(&self, stub: &dyn ChaincodeStub, key: &str, sub_key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(required("key"));
        }
        if sub_key.is_empty() {
            return Err(required("subKey"));
        }
        self.entry_key(stub, key, sub_key)
    }
}
