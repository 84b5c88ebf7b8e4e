//! Invocation execution against the world state
//!
//! `evaluate` runs an operation on a throwaway simulation; `submit` runs it
//! and commits the resulting read/write set. A commit that fails validation
//! returns `CommitConflict` and nothing is retried here.

use log::{debug, info, warn};

use crate::contract::{ContractRegistry, Invocation, InvocationKind};
use crate::error::{CoreError, Result};
use crate::utils::{current_timestamp_millis, generate_tx_id, measure_time};

use super::{ReadWriteSet, Version, WorldState};

/// Outcome of a committed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    /// Payload returned by the operation
    pub payload: Vec<u8>,

    /// Id of the committed transaction
    pub tx_id: String,

    /// Version the transaction committed at
    pub version: Version,
}

/// A world state with the contracts that run against it
#[derive(Debug)]
pub struct Ledger {
    world: WorldState,
    registry: ContractRegistry,
}

impl Ledger {
    /// Create a ledger over an empty world state
    pub fn new(registry: ContractRegistry) -> Self {
        Self::with_world(WorldState::new(), registry)
    }

    /// Create a ledger over an existing world state
    pub fn with_world(world: WorldState, registry: ContractRegistry) -> Self {
        Ledger { world, registry }
    }

    /// The world state
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// The hosted contracts
    pub fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Run an invocation and discard its writes
    pub fn evaluate(&self, invocation: &Invocation) -> Result<Vec<u8>> {
        if let Ok(InvocationKind::Submit) = self.registry.kind_of(invocation) {
            debug!("Evaluating submit operation {}, writes are discarded", invocation.function);
        }

        let (payload, _) = self.simulate(invocation)?;
        Ok(payload)
    }

    /// Run an invocation and commit its writes
    pub fn submit(&self, invocation: &Invocation) -> Result<SubmitResult> {
        let (payload, rwset) = self.simulate(invocation)?;
        let tx_id = rwset.tx_id.clone();
        let version = self.commit(rwset)?;

        info!("Submitted {} as transaction {}", invocation.function, tx_id);
        Ok(SubmitResult { payload, tx_id, version })
    }

    /// Run an invocation on a fresh transaction without committing it
    pub fn simulate(&self, invocation: &Invocation) -> Result<(Vec<u8>, ReadWriteSet)> {
        self.simulate_as(&generate_tx_id(), current_timestamp_millis(), invocation)
    }

    /// Run an invocation as transaction `tx_id` without committing it
    pub fn simulate_as(&self, tx_id: &str, timestamp: i64, invocation: &Invocation) -> Result<(Vec<u8>, ReadWriteSet)> {
        let mut simulator = self.world.simulator(tx_id, timestamp);
        let payload = measure_time(&invocation.function, || self.registry.dispatch(&mut simulator, invocation))?;
        Ok((payload, simulator.into_rwset()))
    }

    /// Validate and apply a simulated transaction
    pub fn commit(&self, rwset: ReadWriteSet) -> Result<Version> {
        let tx_id = rwset.tx_id.clone();
        self.world.commit(rwset).map_err(|e| {
            if let CoreError::CommitConflict(_) = &e {
                warn!("Transaction {} invalidated at commit: {}", tx_id, e);
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::CoreConfig;
    use crate::contract::default_registry;

    fn ledger() -> Ledger {
        Ledger::new(default_registry(Arc::new(CoreConfig::testing())).unwrap())
    }

    #[test]
    fn test_evaluate_discards_writes() {
        let ledger = ledger();
        ledger.evaluate(&Invocation::new("register", &["dev-1"])).unwrap();

        assert!(ledger.world().is_empty().unwrap());
        assert_eq!(ledger.world().height().unwrap(), 0);
    }

    #[test]
    fn test_submit_commits_with_fresh_tx_id() {
        let ledger = ledger();
        let first = ledger.submit(&Invocation::new("register", &["dev-1"])).unwrap();
        let second = ledger.submit(&Invocation::new("register", &["dev-2"])).unwrap();

        assert_ne!(first.tx_id, second.tx_id);
        assert_eq!(first.version.block_num, 1);
        assert_eq!(second.version.block_num, 2);
        assert_eq!(ledger.evaluate(&Invocation::new("queryKey", &["dev-1"])).unwrap(), first.tx_id.as_bytes());
    }

    #[test]
    fn test_concurrent_register_conflicts() {
        let ledger = ledger();
        let invocation = Invocation::new("register", &["dev-1"]);

        let (_, first) = ledger.simulate_as("tx-a", 1, &invocation).unwrap();
        let (_, second) = ledger.simulate_as("tx-b", 2, &invocation).unwrap();

        ledger.commit(first).unwrap();
        assert!(matches!(ledger.commit(second), Err(CoreError::CommitConflict(_))));
        assert_eq!(ledger.evaluate(&invocation).unwrap(), br#"{"result":"exists","hash":"tx-a"}"#);
    }

    #[test]
    fn test_failed_operation_commits_nothing() {
        let ledger = ledger();
        assert!(ledger.submit(&Invocation::new("delete", &["missing"])).is_err());
        assert_eq!(ledger.world().height().unwrap(), 0);
    }
}
