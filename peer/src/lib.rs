//! Peer service hosting the MedData ledger
//!
//! Exposes one channel and one chaincode over HTTP. Invocations are evaluated
//! or submitted against an in-memory world state through the contract
//! registry of `meddata-core`.

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, AppState};
pub use config::PeerConfig;
pub use error::{PeerError, Result};
