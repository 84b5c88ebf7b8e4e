//! The MedData contract
//!
//! Binds the wire operation names existing callers use to the record store,
//! secondary index, query engine and history tracker. Every handler parses its
//! arguments into a parameter struct and serializes the component's result.

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::error::Result;
use crate::models;
use crate::stub::ChaincodeStub;

use super::args::{
    Args, DataTypeParams, FromArgs, KeyParams, PagedQueryParams, RangeParams, SelectorParams, ShareParams,
    SubkeyParams, UploadParams,
};
use super::history::HistoryTracker;
use super::index::SecondaryIndex;
use super::query::QueryEngine;
use super::records::RecordStore;
use super::registry::{Contract, InvocationKind, Operation};

/// Record, index, query and history operations under one namespace
#[derive(Debug, Clone)]
pub struct MedDataContract {
    config: Arc<CoreConfig>,
    records: RecordStore,
    index: SecondaryIndex,
    query: QueryEngine,
    history: HistoryTracker,
}

impl MedDataContract {
    /// Create the contract and its components from one configuration
    pub fn new(config: Arc<CoreConfig>) -> Self {
        MedDataContract {
            records: RecordStore::new(config.clone()),
            index: SecondaryIndex::new(config.clone()),
            query: QueryEngine::new(config.clone()),
            history: HistoryTracker::new(config.clone()),
            config,
        }
    }

    /// Record store component
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Secondary index component
    pub fn index(&self) -> &SecondaryIndex {
        &self.index
    }

    /// Query engine component
    pub fn query(&self) -> &QueryEngine {
        &self.query
    }

    /// History tracker component
    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    fn init_ledger(&self, stub: &mut dyn ChaincodeStub, _args: &Args<'_>) -> Result<Vec<u8>> {
        self.records.init_ledger(stub)?;
        Ok(Vec::new())
    }

    fn register(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.records.register(stub, &params.key)?)
    }

    fn query_key(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        Ok(self.records.query_key(stub, &params.key)?.into_bytes())
    }

    fn delete(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.records.delete(stub, &params.key)?)
    }

    fn request_share(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = ShareParams::from_args(args)?;
        models::to_payload(&self.records.request_share(stub, params)?)
    }

    fn upload_data(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = UploadParams::from_args(args)?;
        models::to_payload(&self.index.upload(stub, params)?)
    }

    fn query_by_subkey(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = SubkeyParams::from_args(args)?;
        models::to_payload(&self.index.query_by_subkey(stub, &params.key, &params.sub_key)?)
    }

    fn check_by_subkey(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = SubkeyParams::from_args(args)?;
        models::to_payload(&self.index.check_by_subkey(stub, &params.key, &params.sub_key)?)
    }

    fn query_data(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = SelectorParams::from_args(args)?;
        models::to_payload(&self.query.query_by_selector(stub, &params.selector)?)
    }

    fn query_data_with_pagination(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = PagedQueryParams::from_args(args)?;
        models::to_payload(&self.query.query_paginated(stub, params)?)
    }

    fn range_with_pagination(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = RangeParams::from_args(args)?;
        models::to_payload(&self.query.range_by_pagination(stub, params)?)
    }

    fn get_history(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.history.get_history(stub, &params.key)?)
    }

    fn get_history_by_data_type(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = DataTypeParams::from_args(args)?;
        models::to_payload(&self.history.get_history_by_data_type(stub, &params.key, &params.data_type)?)
    }

    fn get_key_history(&self, stub: &mut dyn ChaincodeStub, args: &Args<'_>) -> Result<Vec<u8>> {
        let params = KeyParams::from_args(args)?;
        models::to_payload(&self.history.get_key_history(stub, &params.key)?)
    }
}

const MEDDATA_OPERATIONS: &[Operation<MedDataContract>] = &[
    Operation { name: "InitLedger", kind: InvocationKind::Submit, handler: MedDataContract::init_ledger },
    Operation { name: "register", kind: InvocationKind::Submit, handler: MedDataContract::register },
    Operation { name: "queryKey", kind: InvocationKind::Evaluate, handler: MedDataContract::query_key },
    Operation { name: "delete", kind: InvocationKind::Submit, handler: MedDataContract::delete },
    Operation { name: "requestShare", kind: InvocationKind::Submit, handler: MedDataContract::request_share },
    Operation { name: "uploadData", kind: InvocationKind::Submit, handler: MedDataContract::upload_data },
    Operation { name: "queryBySubkey", kind: InvocationKind::Evaluate, handler: MedDataContract::query_by_subkey },
    Operation { name: "checkBySubkey", kind: InvocationKind::Evaluate, handler: MedDataContract::check_by_subkey },
    Operation { name: "queryData", kind: InvocationKind::Evaluate, handler: MedDataContract::query_data },
    Operation {
        name: "getQueryResultForQueryString",
        kind: InvocationKind::Evaluate,
        handler: MedDataContract::query_data,
    },
    Operation {
        name: "queryDataWithPagination",
        kind: InvocationKind::Evaluate,
        handler: MedDataContract::query_data_with_pagination,
    },
    Operation {
        name: "getDataByRangeWithPagination",
        kind: InvocationKind::Evaluate,
        handler: MedDataContract::range_with_pagination,
    },
    Operation { name: "getHistory", kind: InvocationKind::Evaluate, handler: MedDataContract::get_history },
    Operation {
        name: "getHistoryByDataType",
        kind: InvocationKind::Evaluate,
        handler: MedDataContract::get_history_by_data_type,
    },
    Operation { name: "getKeyHistory", kind: InvocationKind::Evaluate, handler: MedDataContract::get_key_history },
];

impl Contract for MedDataContract {
    fn namespace(&self) -> &str {
        &self.config.namespaces.meddata
    }

    fn operations(&self) -> &'static [Operation<Self>] {
        MEDDATA_OPERATIONS
    }
}
