//! Primary-key record store
//!
//! Devices are registered under their own key with the id of the registering
//! transaction as their hash. Share requests live in the same key space at a
//! key chosen by the caller.

use std::sync::Arc;

use log::{debug, info};

use crate::config::CoreConfig;
use crate::error::{required, CoreError, Result};
use crate::models::{self, DeleteResponse, Record, RegisterOutcome, RegisterResponse, ShareRequest};
use crate::stub::ChaincodeStub;

use super::args::ShareParams;

/// Primary-key CRUD on device records and share requests
#[derive(Debug, Clone)]
pub struct RecordStore {
    config: Arc<CoreConfig>,
}

impl RecordStore {
    /// Create a record store
    pub fn new(config: Arc<CoreConfig>) -> Self {
        RecordStore { config }
    }

    /// Register `key`, or return the hash it was registered with
    ///
    /// Writes nothing when the key already holds a record. A zero-length
    /// stored value counts as absent.
    pub fn register(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<RegisterResponse> {
        if key.is_empty() {
            return Err(required("key"));
        }

        if let Some(existing) = stub.get_state(key)?.filter(|bytes| !bytes.is_empty()) {
            let record: Record = decode_record(key, &existing)?;
            debug!("Key {} already registered by {}", key, record.hash);
            return Ok(RegisterResponse {
                result: RegisterOutcome::Exists,
                hash: record.hash,
            });
        }

        let record = Record::new(key, &self.config.register_sub_key, stub.tx_id(), stub.tx_timestamp());
        stub.put_state(key, models::to_payload(&record)?)?;

        info!("Registered key {} in transaction {}", key, record.hash);
        Ok(RegisterResponse {
            result: RegisterOutcome::Success,
            hash: record.hash,
        })
    }

    /// Hash of the record registered under `key`
    pub fn query_key(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<String> {
        let record = self.load(stub, key)?;
        Ok(record.hash)
    }

    /// Delete the record at `key`
    ///
    /// Refuses, without deleting, when the stored record names another key.
    pub fn delete(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<DeleteResponse> {
        if key.is_empty() {
            return Err(required("key"));
        }

        let record = self.load(stub, key)?;
        if record.key != key {
            return Err(CoreError::Corrupted(format!(
                "record stored at {} names key {}",
                key, record.key
            )));
        }

        stub.delete_state(key)?;
        info!("Deleted key {}", key);
        Ok(DeleteResponse { result: true })
    }

    /// Store a share request at `params.key`, replacing whatever was there
    pub fn request_share(&self, stub: &mut dyn ChaincodeStub, params: ShareParams) -> Result<ShareRequest> {
        for (value, field) in [
            (&params.key, "key"),
            (&params.owner, "Owner"),
            (&params.viewer, "Viewer"),
            (&params.data_type, "dataType"),
        ] {
            if value.is_empty() {
                return Err(required(field));
            }
        }

        let request = ShareRequest {
            owner: params.owner,
            timestamp: stub.tx_timestamp(),
            viewer: params.viewer,
            data_type: params.data_type,
            share_fields: params.share_fields,
        };
        stub.put_state(&params.key, models::to_payload(&request)?)?;

        info!(
            "Stored share request at {} ({} asks {} for {})",
            params.key, request.viewer, request.owner, request.data_type
        );
        Ok(request)
    }

    /// Ledger initialisation hook; the record store needs no seed data
    pub fn init_ledger(&self, stub: &mut dyn ChaincodeStub) -> Result<()> {
        debug!("InitLedger called in transaction {}", stub.tx_id());
        Ok(())
    }

    fn load(&self, stub: &mut dyn ChaincodeStub, key: &str) -> Result<Record> {
        if key.is_empty() {
            return Err(CoreError::NotFound("key must not be empty".to_string()));
        }

        match stub.get_state(key)? {
            Some(bytes) if !bytes.is_empty() => decode_record(key, &bytes),
            _ => Err(CoreError::NotFound(format!("key does not exist: {}", key))),
        }
    }
}

fn decode_record(key: &str, bytes: &[u8]) -> Result<Record> {
    models::decode(bytes).map_err(|e| CoreError::Corrupted(format!("value at {} is not a record: {}", key, e)))
}
