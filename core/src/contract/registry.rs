//! Contract registry and invocation dispatch
//!
//! Each contract publishes a namespace and a static table of operations. The
//! registry resolves an invocation to one entry of one table and calls its
//! handler with the transaction's stub and the raw arguments.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::stub::ChaincodeStub;

use super::args::Args;

/// Whether an operation is meant to be evaluated or submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationKind {
    /// Read-only query, the write set is discarded
    Evaluate,

    /// Transaction whose write set is committed
    Submit,
}

/// Handler of one operation of contract `C`
pub type Handler<C> = for<'a, 'b> fn(&C, &mut dyn ChaincodeStub, &'a Args<'b>) -> Result<Vec<u8>>;

/// One entry of a contract's operation table
pub struct Operation<C> {
    /// Wire name of the operation
    pub name: &'static str,

    /// Evaluate or submit
    pub kind: InvocationKind,

    /// Implementation
    pub handler: Handler<C>,
}

/// A contract hosted by the ledger
pub trait Contract: Send + Sync + 'static {
    /// Namespace the contract is registered under
    fn namespace(&self) -> &str;

    /// Operation table
    fn operations(&self) -> &'static [Operation<Self>]
    where
        Self: Sized;
}

/// Object-safe view of a registered contract
trait Dispatch: Send + Sync {
    fn contract_namespace(&self) -> &str;

    fn operation_table(&self) -> Vec<(&'static str, InvocationKind)>;

    fn kind_of(&self, function: &str) -> Option<InvocationKind>;

    fn call(&self, function: &str, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Option<Result<Vec<u8>>>;
}

impl<C: Contract> Dispatch for C {
    fn contract_namespace(&self) -> &str {
        self.namespace()
    }

    fn operation_table(&self) -> Vec<(&'static str, InvocationKind)> {
        self.operations().iter().map(|op| (op.name, op.kind)).collect()
    }

    fn kind_of(&self, function: &str) -> Option<InvocationKind> {
        self.operations().iter().find(|op| op.name == function).map(|op| op.kind)
    }

    fn call(&self, function: &str, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Option<Result<Vec<u8>>> {
        self.operations()
            .iter()
            .find(|op| op.name == function)
            .map(|op| (op.handler)(self, stub, args))
    }
}

/// A request to run one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Namespace of the target contract, default contract when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,

    /// Operation name, optionally qualified as `namespace:name`
    pub function: String,

    /// Positional string arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl Invocation {
    /// Invocation of `function` on the default contract
    pub fn new(function: &str, args: &[&str]) -> Self {
        Invocation {
            contract: None,
            function: function.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Target a specific contract namespace
    pub fn with_contract(mut self, namespace: &str) -> Self {
        self.contract = Some(namespace.to_string());
        self
    }

    /// Namespace and bare operation name
    ///
    /// An explicit `contract` wins; otherwise a `namespace:name` function is
    /// split at its first colon.
    pub fn target(&self) -> (Option<&str>, &str) {
        if let Some(namespace) = self.contract.as_deref() {
            return (Some(namespace), &self.function);
        }
        match self.function.split_once(':') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, &self.function),
        }
    }
}

/// Registered contracts, in registration order
#[derive(Clone, Default)]
pub struct ContractRegistry {
    contracts: Vec<Arc<dyn Dispatch>>,
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("namespaces", &self.namespaces())
            .finish()
    }
}

impl ContractRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract; the first one registered becomes the default
    pub fn register<C: Contract>(&mut self, contract: C) -> Result<()> {
        let namespace = contract.namespace().to_string();
        if self.contracts.iter().any(|c| c.contract_namespace() == namespace) {
            return Err(CoreError::Config(format!("contract {} is already registered", namespace)));
        }

        debug!("Registered contract {} ({} operations)", namespace, contract.operations().len());
        self.contracts.push(Arc::new(contract));
        Ok(())
    }

    /// Namespaces of the registered contracts
    pub fn namespaces(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.contract_namespace()).collect()
    }

    /// Operations of the contract registered under `namespace`
    pub fn operations(&self, namespace: &str) -> Option<Vec<(&'static str, InvocationKind)>> {
        self.contracts
            .iter()
            .find(|c| c.contract_namespace() == namespace)
            .map(|c| c.operation_table())
    }

    fn resolve<'a>(&self, invocation: &'a Invocation) -> Result<(&Arc<dyn Dispatch>, &'a str)> {
        let (namespace, function) = invocation.target();
        let contract = match namespace {
            Some(namespace) => self.contracts.iter().find(|c| c.contract_namespace() == namespace),
            None => self.contracts.first(),
        };

        let contract = contract.ok_or_else(|| {
            CoreError::UnknownFunction(format!("no contract registered under {}", namespace.unwrap_or("<default>")))
        })?;
        Ok((contract, function))
    }

    /// Declared kind of the invoked operation
    pub fn kind_of(&self, invocation: &Invocation) -> Result<InvocationKind> {
        let (contract, function) = self.resolve(invocation)?;
        contract
            .kind_of(function)
            .ok_or_else(|| unknown_function(contract.contract_namespace(), function))
    }

    /// Run the invoked operation against `stub`
    pub fn dispatch(&self, stub: &mut dyn ChaincodeStub, invocation: &Invocation) -> Result<Vec<u8>> {
        let (contract, function) = self.resolve(invocation)?;
        let args = Args::new(function, &invocation.args);

        debug!(
            "Dispatching {}:{} with {} argument(s) in transaction {}",
            contract.contract_namespace(),
            function,
            args.len(),
            stub.tx_id()
        );
        contract
            .call(function, stub, &args)
            .unwrap_or_else(|| Err(unknown_function(contract.contract_namespace(), function)))
    }
}

fn unknown_function(namespace: &str, function: &str) -> CoreError {
    CoreError::UnknownFunction(format!("{} has no operation named {}", namespace, function))
}
