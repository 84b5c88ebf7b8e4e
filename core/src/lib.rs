//! # MedData Core
//!
//! Record store and query layer of the MedData ledger contracts.
//! This crate provides the contracts (record store, secondary index, query
//! engine, history tracker, task store), the world-state primitives they run
//! against, and an in-memory world state with commit-time validation.

#![forbid(unsafe_code)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod contract;
pub mod error;
pub mod models;
pub mod stub;
pub mod utils;
pub mod world;

/// Re-export common types for ease of use
pub use config::CoreConfig;
pub use contract::{default_registry, ContractRegistry, Invocation, InvocationKind, MedDataContract, TaskStore};
pub use error::{CoreError, Result};
pub use models::{IndexedDatum, Record, ShareRequest, Task};
pub use stub::{ChaincodeStub, StateIterator};
pub use world::{Ledger, SubmitResult, WorldState};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ledger_from_default_config() {
        let registry = default_registry(Arc::new(CoreConfig::default())).unwrap();
        let ledger = Ledger::new(registry);

        let result = ledger.submit(&Invocation::new("register", &["dev-1"])).unwrap();
        let hash = ledger.evaluate(&Invocation::new("queryKey", &["dev-1"])).unwrap();
        assert_eq!(hash, result.tx_id.into_bytes());
        assert!(!VERSION.is_empty());
    }
}
