//! Scan draining
//!
//! Every scan-returning operation hands its cursor to the `ResultCollector`,
//! which pulls entries until the cursor reports exhaustion and decodes each
//! payload as JSON, keeping the raw string when a payload is not JSON. The
//! cursor is owned by a guard for the whole pass, so it is released on every
//! exit path.

use log::{debug, warn};
use serde_json::Value;

use crate::error::Result;
use crate::models::{HistoryEntry, KeyedRecord};
use crate::stub::{BoxedIterator, KeyModification, KeyValue, StateIterator};

/// Closes the wrapped cursor when dropped, unless `finish` already did
struct CursorGuard<T> {
    cursor: Option<BoxedIterator<T>>,
}

impl<T> CursorGuard<T> {
    fn new(cursor: BoxedIterator<T>) -> Self {
        CursorGuard { cursor: Some(cursor) }
    }

    fn next(&mut self) -> Result<Option<T>> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.next(),
            None => Ok(None),
        }
    }

    /// Close the cursor, propagating the close error
    fn finish(mut self) -> Result<()> {
        match self.cursor.take() {
            Some(mut cursor) if !cursor.is_closed() => cursor.close(),
            _ => Ok(()),
        }
    }
}

impl<T> Drop for CursorGuard<T> {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if !cursor.is_closed() {
                if let Err(e) = cursor.close() {
                    warn!("Failed to close scan cursor: {}", e);
                }
            }
        }
    }
}

/// Drains scan cursors into response entries
pub struct ResultCollector;

impl ResultCollector {
    /// Collect a key/value scan into `{Key, Record}` entries
    pub fn collect_records(cursor: BoxedIterator<KeyValue>) -> Result<Vec<KeyedRecord>> {
        let mut guard = CursorGuard::new(cursor);
        let mut records = Vec::new();

        while let Some(kv) = guard.next()? {
            let record = decode_lenient(&kv.key, &kv.value);
            records.push(KeyedRecord { key: kv.key, record });
        }

        guard.finish()?;
        debug!("Collected {} scan entries", records.len());
        Ok(records)
    }

    /// Collect a key history into `{TxId, Timestamp, IsDelete, Value}` entries
    pub fn collect_history(cursor: BoxedIterator<KeyModification>) -> Result<Vec<HistoryEntry>> {
        let mut guard = CursorGuard::new(cursor);
        let mut entries = Vec::new();

        while let Some(modification) = guard.next()? {
            let value = decode_lenient(&modification.tx_id, &modification.value);
            entries.push(HistoryEntry {
                tx_id: modification.tx_id,
                timestamp: modification.timestamp,
                is_delete: modification.is_delete,
                value,
            });
        }

        guard.finish()?;
        debug!("Collected {} history entries", entries.len());
        Ok(entries)
    }
}

/// Decode a payload as JSON; non-JSON payloads become a JSON string, empty ones null
fn decode_lenient(origin: &str, payload: &[u8]) -> Value {
    if payload.is_empty() {
        return Value::Null;
    }

    match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(e) => {
            warn!("Payload of {:?} is not JSON, keeping raw string: {}", origin, e);
            Value::String(String::from_utf8_lossy(payload).into_owned())
        }
    }
}
