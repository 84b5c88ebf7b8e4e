//! Client library for invoking the MedData ledger contracts
//!
//! This library provides a session transport (gateway, network and contract
//! handles) and a typed client for the MedData contract.

pub mod gateway;
pub mod meddata;
pub mod transport;

pub use gateway::{Contract, Gateway, Network};
pub use meddata::MedDataClient;
pub use transport::{ClientError, HttpTransport, LedgerTransport, LocalTransport, Result, Submitted};
