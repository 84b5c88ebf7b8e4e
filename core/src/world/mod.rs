//! In-memory world state
//!
//! This module provides a versioned key-value world state with the commit
//! semantics of an optimistic-concurrency ledger: transactions are simulated
//! against committed state by a `TxSimulator`, which records a read/write set,
//! and `WorldState::commit` validates that read set against the state current
//! at commit time before applying any write.

mod ledger;
mod selector;
mod simulator;

pub use ledger::{Ledger, SubmitResult};
pub use selector::RichQuery;
pub use simulator::TxSimulator;

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

use log::{debug, info};

use crate::error::{to_stub_error, CoreError, Result};
use crate::stub::KeyModification;

/// Version of a committed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Block that committed the value
    pub block_num: u64,

    /// Position of the transaction in the block
    pub tx_num: u64,
}

/// A committed value together with its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Stored payload
    pub value: Vec<u8>,

    /// Version that wrote the payload
    pub version: Version,
}

/// A range scan observed during simulation, re-executed at commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQueryInfo {
    /// Inclusive start key
    pub start: String,

    /// Upper bound of the keys the simulation actually covered
    pub upper: Bound<String>,

    /// Keys and versions observed
    pub observed: Vec<(String, Version)>,
}

/// Read/write set accumulated by one transaction simulation
#[derive(Debug, Clone, Default)]
pub struct ReadWriteSet {
    /// Transaction id
    pub tx_id: String,

    /// Transaction timestamp in milliseconds
    pub timestamp: i64,

    /// Point reads and the version observed (`None` for absent keys)
    pub reads: BTreeMap<String, Option<Version>>,

    /// Range scans to re-execute for phantom detection
    pub range_queries: Vec<RangeQueryInfo>,

    /// Pending writes, `None` marks a delete
    pub writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl ReadWriteSet {
    /// Whether the simulation wrote nothing
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

#[derive(Debug, Default)]
struct WorldInner {
    state: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<KeyModification>>,
    height: u64,
}

/// Versioned, append-only world state
#[derive(Debug, Default)]
pub struct WorldState {
    inner: RwLock<WorldInner>,
}

fn range_bounds(start: &str, upper: &Bound<String>) -> Option<(Bound<String>, Bound<String>)> {
    let empty = match upper {
        Bound::Included(end) => start > end.as_str(),
        Bound::Excluded(end) => start >= end.as_str(),
        Bound::Unbounded => false,
    };
    if empty {
        None
    } else {
        Some((Bound::Included(start.to_string()), upper.clone()))
    }
}

impl WorldState {
    /// Create an empty world state
    pub fn new() -> Self {
        Self::default()
    }

    /// Start simulating a transaction against this state
    pub fn simulator(&self, tx_id: &str, timestamp: i64) -> TxSimulator<'_> {
        TxSimulator::new(self, tx_id, timestamp)
    }

    /// Number of committed blocks
    pub fn height(&self) -> Result<u64> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(inner.height)
    }

    /// Number of live keys
    pub fn len(&self) -> Result<usize> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(inner.state.len())
    }

    /// Whether the state holds no keys
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read a committed value
    pub fn get(&self, key: &str) -> Result<Option<VersionedValue>> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(inner.state.get(key).cloned())
    }

    /// Committed entries with keys in `[start, upper)`, at most `limit` of them
    pub fn scan(
        &self,
        start: &str,
        upper: &Bound<String>,
        limit: Option<usize>,
    ) -> Result<Vec<(String, VersionedValue)>> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(Self::scan_locked(&inner, start, upper, limit))
    }

    fn scan_locked(
        inner: &WorldInner,
        start: &str,
        upper: &Bound<String>,
        limit: Option<usize>,
    ) -> Vec<(String, VersionedValue)> {
        let bounds = match range_bounds(start, upper) {
            Some(bounds) => bounds,
            None => return Vec::new(),
        };

        inner.state
            .range::<String, _>(bounds)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Committed entries matching a rich query, in key order, starting at `from`
    pub fn query(&self, query: &RichQuery, from: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(inner.state
            .range::<str, _>((Bound::Included(from), Bound::Unbounded))
            .filter(|(_, v)| query.matches_payload(&v.value))
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect())
    }

    /// Modification history of a key, newest first
    pub fn history(&self, key: &str) -> Result<Vec<KeyModification>> {
        let inner = self.inner.read()
            .map_err(to_stub_error)?;

        Ok(inner.history
            .get(key)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    /// Validate a read/write set against current state and apply its writes
    ///
    /// Fails with `CommitConflict`, applying nothing, if any key read during
    /// simulation changed version or any recorded range scan now returns a
    /// different set of keys or versions.
    pub fn commit(&self, rwset: ReadWriteSet) -> Result<Version> {
        let mut inner = self.inner.write()
            .map_err(to_stub_error)?;

        Self::validate_locked(&inner, &rwset)?;

        let version = Version {
            block_num: inner.height + if rwset.is_read_only() { 0 } else { 1 },
            tx_num: 0,
        };
        if rwset.is_read_only() {
            debug!("Transaction {} is read-only, nothing to apply", rwset.tx_id);
            return Ok(version);
        }

        inner.height = version.block_num;
        for (key, write) in rwset.writes {
            let existed = inner.state.contains_key(&key);
            let modification = match write {
                Some(value) => {
                    inner.state.insert(key.clone(), VersionedValue { value: value.clone(), version });
                    KeyModification {
                        tx_id: rwset.tx_id.clone(),
                        timestamp: rwset.timestamp,
                        is_delete: false,
                        value,
                    }
                }
                None => {
                    inner.state.remove(&key);
                    if !existed {
                        continue;
                    }
                    KeyModification {
                        tx_id: rwset.tx_id.clone(),
                        timestamp: rwset.timestamp,
                        is_delete: true,
                        value: Vec::new(),
                    }
                }
            };
            inner.history.entry(key).or_default().push(modification);
        }

        info!("Committed transaction {} at block {}", rwset.tx_id, version.block_num);
        Ok(version)
    }

    fn validate_locked(inner: &WorldInner, rwset: &ReadWriteSet) -> Result<()> {
        for (key, observed) in &rwset.reads {
            let current = inner.state.get(key).map(|v| v.version);
            if current != *observed {
                return Err(CoreError::CommitConflict(format!(
                    "transaction {} read key {:?} at version {:?}, now {:?}",
                    rwset.tx_id, key, observed, current
                )));
            }
        }

        for range in &rwset.range_queries {
            let current: Vec<(String, Version)> = Self::scan_locked(inner, &range.start, &range.upper, None)
                .into_iter()
                .map(|(k, v)| (k, v.version))
                .collect();
            if current != range.observed {
                return Err(CoreError::CommitConflict(format!(
                    "transaction {} range scan from {:?} changed ({} entries observed, {} now)",
                    rwset.tx_id,
                    range.start,
                    range.observed.len(),
                    current.len()
                )));
            }
        }

        Ok(())
    }
}
