//! Gateway, network and contract handles
//!
//! A `Gateway` is a session with one ledger endpoint. From it the caller
//! resolves a `Network` (a channel), and from the network a `Contract` (a
//! deployed chaincode, optionally narrowed to one contract namespace).
//! Handles are cheap to clone and share the gateway's transport.

use std::sync::Arc;

use log::debug;
use meddata_core::Invocation;

use crate::transport::{ClientError, HttpTransport, LedgerTransport, Result, Submitted};

/// Session with a ledger endpoint
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn LedgerTransport>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Connect to the peer at `base_url`
    pub fn connect(base_url: &str) -> Self {
        debug!("Gateway connected to {}", base_url);
        Self::with_transport(Arc::new(HttpTransport::new(base_url)))
    }

    /// Use an existing transport
    pub fn with_transport(transport: Arc<dyn LedgerTransport>) -> Self {
        Gateway { transport }
    }

    /// Handle to a channel
    pub fn network(&self, channel: &str) -> Result<Network> {
        if channel.is_empty() {
            return Err(ClientError::Session("channel name must not be empty".to_string()));
        }
        Ok(Network {
            transport: self.transport.clone(),
            channel: channel.to_string(),
        })
    }
}

/// Handle to a channel of the ledger
#[derive(Clone)]
pub struct Network {
    transport: Arc<dyn LedgerTransport>,
    channel: String,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network").field("channel", &self.channel).finish_non_exhaustive()
    }
}

impl Network {
    /// Channel name
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Default contract of a chaincode
    pub fn contract(&self, chaincode: &str) -> Result<Contract> {
        self.build_contract(chaincode, None)
    }

    /// A named contract of a chaincode
    pub fn contract_with_name(&self, chaincode: &str, contract: &str) -> Result<Contract> {
        if contract.is_empty() {
            return Err(ClientError::Session("contract name must not be empty".to_string()));
        }
        self.build_contract(chaincode, Some(contract.to_string()))
    }

    fn build_contract(&self, chaincode: &str, contract: Option<String>) -> Result<Contract> {
        if chaincode.is_empty() {
            return Err(ClientError::Session("chaincode name must not be empty".to_string()));
        }
        Ok(Contract {
            transport: self.transport.clone(),
            channel: self.channel.clone(),
            chaincode: chaincode.to_string(),
            contract,
        })
    }
}

/// Handle to one contract of a deployed chaincode
#[derive(Clone)]
pub struct Contract {
    transport: Arc<dyn LedgerTransport>,
    channel: String,
    chaincode: String,
    contract: Option<String>,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("channel", &self.channel)
            .field("chaincode", &self.chaincode)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl Contract {
    /// Chaincode name
    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    fn invocation(&self, function: &str, args: &[&str]) -> Invocation {
        let invocation = Invocation::new(function, args);
        match &self.contract {
            Some(contract) => invocation.with_contract(contract),
            None => invocation,
        }
    }

    /// Evaluate a query operation
    pub async fn evaluate_transaction(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        let invocation = self.invocation(function, args);
        self.transport.evaluate(&self.channel, &self.chaincode, &invocation).await
    }

    /// Submit a transaction operation, returning its payload
    pub async fn submit_transaction(&self, function: &str, args: &[&str]) -> Result<Vec<u8>> {
        Ok(self.submit(function, args).await?.payload)
    }

    /// Submit a transaction operation, returning its payload and transaction id
    pub async fn submit(&self, function: &str, args: &[&str]) -> Result<Submitted> {
        let invocation = self.invocation(function, args);
        self.transport.submit(&self.channel, &self.chaincode, &invocation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meddata_core::{default_registry, CoreConfig, Ledger};

    use crate::transport::LocalTransport;

    fn gateway() -> Gateway {
        let ledger = Ledger::new(default_registry(Arc::new(CoreConfig::testing())).unwrap());
        Gateway::with_transport(Arc::new(LocalTransport::new(Arc::new(ledger))))
    }

    #[tokio::test]
    async fn test_contract_handles_share_the_session() {
        let gateway = gateway();
        let network = gateway.network("ttchannel").unwrap();
        let meddata = network.contract("ttdata").unwrap();
        let tasks = network.contract_with_name("ttdata", "org.ttdata.assettask").unwrap();

        let submitted = meddata.submit("register", &["dev-1"]).await.unwrap();
        let hash = meddata.evaluate_transaction("queryKey", &["dev-1"]).await.unwrap();
        assert_eq!(Some(String::from_utf8(hash).unwrap()), submitted.tx_id);

        tasks.submit_transaction("InitTask", &[]).await.unwrap();
        let exists = tasks.evaluate_transaction("TaskExists", &["Task-2"]).await.unwrap();
        assert_eq!(exists, b"true");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let gateway = gateway();
        assert!(matches!(gateway.network(""), Err(ClientError::Session(_))));

        let network = tokio_test::assert_ok!(gateway.network("ttchannel"));
        assert_eq!(network.channel(), "ttchannel");
        assert!(network.contract("").is_err());
        assert!(network.contract_with_name("ttdata", "").is_err());
    }
}
