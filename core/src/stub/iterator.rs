//! Pull-based scan cursors
//!
//! A scan opened against the world state hands back a `StateIterator`. It is
//! finite and not restartable: `next` yields entries until it returns
//! `Ok(None)`, after which the cursor must be closed. Closing is idempotent.

use std::collections::VecDeque;

use crate::error::{CoreError, Result};

/// A scan cursor over world-state entries
pub trait StateIterator<T> {
    /// Fetch the next entry, `Ok(None)` once the scan is exhausted
    fn next(&mut self) -> Result<Option<T>>;

    /// Release the cursor
    fn close(&mut self) -> Result<()>;

    /// Whether the cursor has been released
    fn is_closed(&self) -> bool;
}

/// Boxed cursor as returned by the stub primitives
pub type BoxedIterator<T> = Box<dyn StateIterator<T> + Send>;

/// Cursor over a materialized result set
#[derive(Debug)]
pub struct SnapshotIterator<T> {
    entries: VecDeque<T>,
    closed: bool,
}

impl<T> SnapshotIterator<T> {
    /// Create a cursor yielding `entries` in order
    pub fn new(entries: Vec<T>) -> Self {
        SnapshotIterator {
            entries: entries.into(),
            closed: false,
        }
    }

    /// Box the cursor
    pub fn boxed(entries: Vec<T>) -> BoxedIterator<T>
    where
        T: Send + 'static,
    {
        Box::new(Self::new(entries))
    }
}

impl<T> StateIterator<T> for SnapshotIterator<T> {
    fn next(&mut self) -> Result<Option<T>> {
        if self.closed {
            return Err(CoreError::Stub("iterator is closed".to_string()));
        }
        Ok(self.entries.pop_front())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.entries.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
