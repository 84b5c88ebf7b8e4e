//! World-state primitives
//!
//! The contracts never touch storage directly. Everything they read or write
//! goes through a `ChaincodeStub` bound to a single transaction, which is
//! responsible for recording the read/write set that the ledger validates at
//! commit time.

pub mod composite;
mod iterator;

pub use composite::{create_composite_key, split_composite_key};
pub use iterator::{BoxedIterator, SnapshotIterator, StateIterator};

use crate::error::Result;

/// A key/value pair returned by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// World-state key
    pub key: String,

    /// Stored payload
    pub value: Vec<u8>,
}

/// One entry of a key's modification history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// Transaction that made the modification
    pub tx_id: String,

    /// Commit time in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Whether the modification deleted the key
    pub is_delete: bool,

    /// Value written, empty for deletes
    pub value: Vec<u8>,
}

/// Metadata of a paginated scan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryResponseMetadata {
    /// Entries fetched in this page
    pub fetched_records_count: u32,

    /// Opaque bookmark of the next page, empty when the scan is complete
    pub bookmark: String,
}

/// Transaction-scoped access to the world state
pub trait ChaincodeStub {
    /// Id of the invoking transaction
    fn tx_id(&self) -> &str;

    /// Timestamp of the invoking transaction, milliseconds since the Unix epoch
    fn tx_timestamp(&self) -> i64;

    /// Read a key; `None` when the key is absent
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete a key
    fn delete_state(&mut self, key: &str) -> Result<()>;

    /// Scan simple keys in `[start_key, end_key)`
    ///
    /// An empty `start_key` starts at the first simple key, an empty
    /// `end_key` leaves the range open. Composite keys are never returned.
    fn get_state_by_range(&mut self, start_key: &str, end_key: &str) -> Result<BoxedIterator<KeyValue>>;

    /// Scan one page of simple keys in `[start_key, end_key)`
    fn get_state_by_range_with_pagination(
        &mut self,
        start_key: &str,
        end_key: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIterator<KeyValue>, QueryResponseMetadata)>;

    /// Scan every composite key extending `(object_type, attributes)`
    fn get_state_by_partial_composite_key(
        &mut self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<BoxedIterator<KeyValue>>;

    /// Run a rich query; the query string is interpreted by the world state
    fn get_query_result(&mut self, query: &str) -> Result<BoxedIterator<KeyValue>>;

    /// Run one page of a rich query
    fn get_query_result_with_pagination(
        &mut self,
        query: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIterator<KeyValue>, QueryResponseMetadata)>;

    /// Modification history of a key, newest first
    fn get_history_for_key(&mut self, key: &str) -> Result<BoxedIterator<KeyModification>>;

    /// Build a composite key
    fn create_composite_key(&self, object_type: &str, attributes: &[&str]) -> Result<String> {
        composite::create_composite_key(object_type, attributes)
    }
}
