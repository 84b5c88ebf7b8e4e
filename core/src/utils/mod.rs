//! Utility functions and helpers
//!
//! Transaction ids, clock access and bookmark encoding shared by the ledger
//! and the world state.

use std::time::Instant;

use chrono::Utc;
use log::debug;
use uuid::Uuid;

/// Generate a transaction id (UUID v4, simple form)
pub fn generate_tx_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Generate a timestamp in milliseconds since UNIX epoch
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Measure execution time of a closure
pub fn measure_time<F, T>(name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    debug!("{} took {}ms", name, start.elapsed().as_millis());
    result
}

/// Convert a byte array to a hex string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Convert a hex string to a byte array
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(hex)
}
