//! Transaction simulator
//!
//! Implements the stub primitives for one transaction against committed state.
//! Reads observe committed state only (never the simulator's own pending
//! writes); every point read and range scan is recorded so that the commit can
//! be validated later.

use std::ops::Bound;

use log::debug;

use crate::error::{CoreError, Result};
use crate::stub::composite::{self, partial_key_range_end};
use crate::stub::{BoxedIterator, ChaincodeStub, KeyModification, KeyValue, QueryResponseMetadata, SnapshotIterator};
use crate::utils::{bytes_to_hex, hex_to_bytes};

use super::{RangeQueryInfo, ReadWriteSet, RichQuery, Version, VersionedValue, WorldState};

/// Replacement for an empty range start, the first key after the composite namespace
const EMPTY_KEY_SUBSTITUTE: &str = "\u{1}";

/// Stub implementation simulating one transaction
#[derive(Debug)]
pub struct TxSimulator<'a> {
    world: &'a WorldState,
    rwset: ReadWriteSet,
}

fn encode_bookmark(key: &str) -> String {
    bytes_to_hex(key.as_bytes())
}

fn decode_bookmark(bookmark: &str) -> Result<Option<String>> {
    if bookmark.is_empty() {
        return Ok(None);
    }
    let bytes = hex_to_bytes(bookmark)
        .map_err(|e| CoreError::InvalidArgument(format!("invalid bookmark {:?}: {}", bookmark, e)))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| CoreError::InvalidArgument(format!("invalid bookmark {:?}: {}", bookmark, e)))
}

fn check_page_size(page_size: u32) -> Result<usize> {
    if page_size == 0 {
        return Err(CoreError::InvalidArgument("page size must be positive".to_string()));
    }
    Ok(page_size as usize)
}

/// Split off the entry past the page, returning the bookmark it starts
fn split_page<T>(entries: &mut Vec<(String, T)>, page_size: usize) -> Option<String> {
    if entries.len() > page_size {
        entries.truncate(page_size + 1);
        entries.pop().map(|(key, _)| key)
    } else {
        None
    }
}

impl<'a> TxSimulator<'a> {
    /// Create a simulator for transaction `tx_id`
    pub fn new(world: &'a WorldState, tx_id: &str, timestamp: i64) -> Self {
        TxSimulator {
            world,
            rwset: ReadWriteSet {
                tx_id: tx_id.to_string(),
                timestamp,
                ..Default::default()
            },
        }
    }

    /// The read/write set recorded so far
    pub fn rwset(&self) -> &ReadWriteSet {
        &self.rwset
    }

    /// Finish the simulation
    pub fn into_rwset(self) -> ReadWriteSet {
        self.rwset
    }

    fn check_writable_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CoreError::InvalidArgument("key must not be an empty string".to_string()));
        }
        Ok(())
    }

    fn check_simple_range_key(key: &str) -> Result<()> {
        if composite::is_composite_key(key) {
            return Err(CoreError::InvalidArgument(format!(
                "range key {:?} must not start with a null character",
                key
            )));
        }
        Ok(())
    }

    fn resolve_range(start_key: &str, end_key: &str) -> Result<(String, Bound<String>)> {
        Self::check_simple_range_key(start_key)?;
        Self::check_simple_range_key(end_key)?;

        let start = if start_key.is_empty() { EMPTY_KEY_SUBSTITUTE } else { start_key };
        let upper = if end_key.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end_key.to_string())
        };
        Ok((start.to_string(), upper))
    }

    fn scan_and_record(&mut self, start: String, upper: Bound<String>) -> Result<BoxedIterator<KeyValue>> {
        let entries = self.world.scan(&start, &upper, None)?;
        self.record_range(start, upper, &entries);

        Ok(SnapshotIterator::boxed(
            entries
                .into_iter()
                .map(|(key, v)| KeyValue { key, value: v.value })
                .collect(),
        ))
    }

    fn record_range(&mut self, start: String, upper: Bound<String>, entries: &[(String, VersionedValue)]) {
        let observed: Vec<(String, Version)> = entries.iter().map(|(k, v)| (k.clone(), v.version)).collect();
        self.rwset.range_queries.push(RangeQueryInfo { start, upper, observed });
    }
}

impl ChaincodeStub for TxSimulator<'_> {
    fn tx_id(&self) -> &str {
        &self.rwset.tx_id
    }

    fn tx_timestamp(&self) -> i64 {
        self.rwset.timestamp
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Self::check_writable_key(key)?;

        let committed = self.world.get(key)?;
        self.rwset
            .reads
            .entry(key.to_string())
            .or_insert(committed.as_ref().map(|v| v.version));

        Ok(committed.map(|v| v.value))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        Self::check_writable_key(key)?;
        debug!("Transaction {} writes {:?} ({} bytes)", self.rwset.tx_id, key, value.len());
        self.rwset.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> Result<()> {
        Self::check_writable_key(key)?;
        debug!("Transaction {} deletes {:?}", self.rwset.tx_id, key);
        self.rwset.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn get_state_by_range(&mut self, start_key: &str, end_key: &str) -> Result<BoxedIterator<KeyValue>> {
        let (start, upper) = Self::resolve_range(start_key, end_key)?;
        self.scan_and_record(start, upper)
    }

    fn get_state_by_range_with_pagination(
        &mut self,
        start_key: &str,
        end_key: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIterator<KeyValue>, QueryResponseMetadata)> {
        let page_size = check_page_size(page_size)?;
        let (start, upper) = Self::resolve_range(start_key, end_key)?;
        let from = match decode_bookmark(bookmark)? {
            Some(resume) if resume > start => resume,
            _ => start,
        };

        let mut entries = self.world.scan(&from, &upper, Some(page_size + 1))?;
        let next = split_page(&mut entries, page_size);

        let covered = match (&next, entries.last()) {
            (Some(_), Some((last, _))) => Bound::Included(last.clone()),
            _ => upper,
        };
        self.record_range(from, covered, &entries);

        let metadata = QueryResponseMetadata {
            fetched_records_count: entries.len() as u32,
            bookmark: next.as_deref().map(encode_bookmark).unwrap_or_default(),
        };
        let page = entries
            .into_iter()
            .map(|(key, v)| KeyValue { key, value: v.value })
            .collect();

        Ok((SnapshotIterator::boxed(page), metadata))
    }

    fn get_state_by_partial_composite_key(
        &mut self,
        object_type: &str,
        attributes: &[&str],
    ) -> Result<BoxedIterator<KeyValue>> {
        let prefix = composite::create_composite_key(object_type, attributes)?;
        let upper = Bound::Excluded(partial_key_range_end(&prefix));
        self.scan_and_record(prefix, upper)
    }

    fn get_query_result(&mut self, query: &str) -> Result<BoxedIterator<KeyValue>> {
        let query = RichQuery::parse(query)?;
        let mut matches = self.world.query(&query, "")?;
        if let Some(limit) = query.limit() {
            matches.truncate(limit);
        }

        Ok(SnapshotIterator::boxed(
            matches.into_iter().map(|(key, value)| KeyValue { key, value }).collect(),
        ))
    }

    fn get_query_result_with_pagination(
        &mut self,
        query: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<(BoxedIterator<KeyValue>, QueryResponseMetadata)> {
        let page_size = check_page_size(page_size)?;
        let query = RichQuery::parse(query)?;
        let from = decode_bookmark(bookmark)?.unwrap_or_default();

        let mut matches = self.world.query(&query, &from)?;
        let next = split_page(&mut matches, page_size);

        let metadata = QueryResponseMetadata {
            fetched_records_count: matches.len() as u32,
            bookmark: next.as_deref().map(encode_bookmark).unwrap_or_default(),
        };

        Ok((
            SnapshotIterator::boxed(matches.into_iter().map(|(key, value)| KeyValue { key, value }).collect()),
            metadata,
        ))
    }

    fn get_history_for_key(&mut self, key: &str) -> Result<BoxedIterator<KeyModification>> {
        Self::check_writable_key(key)?;
        Ok(SnapshotIterator::boxed(self.world.history(key)?))
    }
}
