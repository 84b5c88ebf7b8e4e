/// MedData Ledger - record store and query layer over a ledger world state
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `meddata-core`: Record store, secondary index, queries and the in-memory world state
/// - `meddata-client`: Session transport and typed client for invoking the contracts
/// - `meddata-peer`: HTTP service hosting a ledger for evaluate/submit invocations

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
