//! Contracts hosted by the ledger
//!
//! The MedData contract is assembled from four components sharing one
//! configuration: the `RecordStore` (primary keys), the `SecondaryIndex`
//! (composite `(key, subKey)` entries), the `QueryEngine` (rich queries and
//! paginated scans) and the `HistoryTracker`. The `TaskStore` is a second,
//! independent contract. Both are reached through the `ContractRegistry`.

mod args;
mod collector;
mod history;
mod index;
mod meddata;
mod query;
mod records;
mod registry;
mod task;

pub use args::{
    Args, DataTypeParams, FromArgs, KeyParams, PagedQueryParams, RangeParams, SelectorParams, ShareParams,
    SubkeyParams, TaskParams, TransferParams, UploadParams,
};
pub use collector::ResultCollector;
pub use history::HistoryTracker;
pub use index::SecondaryIndex;
pub use meddata::MedDataContract;
pub use query::QueryEngine;
pub use records::RecordStore;
pub use registry::{Contract, ContractRegistry, Handler, Invocation, InvocationKind, Operation};
pub use task::TaskStore;

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::Result;

/// Registry hosting the MedData contract (default) and the task contract
pub fn default_registry(config: Arc<CoreConfig>) -> Result<ContractRegistry> {
    config.validate()?;

    let mut registry = ContractRegistry::new();
    registry.register(MedDataContract::new(config.clone()))?;
    registry.register(TaskStore::new(config))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry(Arc::new(CoreConfig::default())).unwrap();
        assert_eq!(registry.namespaces(), vec!["org.ttdata.meddata", "org.ttdata.assettask"]);
        assert_eq!(
            registry.kind_of(&Invocation::new("register", &["k"])).unwrap(),
            InvocationKind::Submit
        );
        assert_eq!(
            registry
                .kind_of(&Invocation::new("org.ttdata.assettask:ReadTask", &["Task-1"]))
                .unwrap(),
            InvocationKind::Evaluate
        );
    }

    #[test]
    fn test_default_registry_validates_config() {
        let mut config = CoreConfig::default();
        config.namespaces.asset_task = config.namespaces.meddata.clone();
        assert!(default_registry(Arc::new(config)).is_err());
    }
}
