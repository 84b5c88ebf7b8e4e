//! Typed client for the MedData contract
//!
//! Wraps a `Contract` handle and maps every MedData operation onto a typed
//! method, decoding the JSON payloads into the core response models.

use meddata_core::models::{
    CheckResponse, DeleteResponse, HistoryEntry, IndexedDatum, KeyedRecord, Page, RangePage, RegisterResponse,
    ShareRequest, UploadResponse,
};
use serde::de::DeserializeOwned;

use crate::gateway::Contract;
use crate::transport::Result;

/// Typed MedData operations over a contract handle
#[derive(Debug, Clone)]
pub struct MedDataClient {
    contract: Contract,
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

impl MedDataClient {
    /// Wrap a contract handle resolved to the MedData contract
    pub fn new(contract: Contract) -> Self {
        MedDataClient { contract }
    }

    /// The underlying contract handle
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Register a device key
    pub async fn register(&self, key: &str) -> Result<RegisterResponse> {
        parse(&self.contract.submit_transaction("register", &[key]).await?)
    }

    /// Upload a datum under `(key, sub_key)`
    pub async fn upload_data(&self, key: &str, sub_key: &str, data_type: &str, hash: &str) -> Result<UploadResponse> {
        parse(&self.contract.submit_transaction("uploadData", &[key, sub_key, data_type, hash]).await?)
    }

    /// Hash a key was registered with
    pub async fn query_key(&self, key: &str) -> Result<String> {
        let payload = self.contract.evaluate_transaction("queryKey", &[key]).await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Datum stored under `(key, sub_key)`
    pub async fn query_by_subkey(&self, key: &str, sub_key: &str) -> Result<IndexedDatum> {
        parse(&self.contract.evaluate_transaction("queryBySubkey", &[key, sub_key]).await?)
    }

    /// Whether `(key, sub_key)` is set
    pub async fn check_by_subkey(&self, key: &str, sub_key: &str) -> Result<CheckResponse> {
        parse(&self.contract.evaluate_transaction("checkBySubkey", &[key, sub_key]).await?)
    }

    /// Entries matching a rich-query selector
    pub async fn query_data(&self, selector: &str) -> Result<Vec<KeyedRecord>> {
        parse(&self.contract.evaluate_transaction("queryData", &[selector]).await?)
    }

    /// One page of a rich query
    pub async fn query_data_with_pagination(&self, selector: &str, page_size: u32, bookmark: &str) -> Result<Page> {
        let page_size = page_size.to_string();
        parse(
            &self.contract
                .evaluate_transaction("queryDataWithPagination", &[selector, &page_size, bookmark])
                .await?,
        )
    }

    /// One page of the simple keys in `[start_key, end_key)`
    pub async fn get_data_by_range_with_pagination(
        &self,
        start_key: &str,
        end_key: &str,
        page_size: u32,
        bookmark: &str,
    ) -> Result<RangePage> {
        let page_size = page_size.to_string();
        parse(
            &self.contract
                .evaluate_transaction("getDataByRangeWithPagination", &[start_key, end_key, &page_size, bookmark])
                .await?,
        )
    }

    /// Every index entry of `key`
    pub async fn get_history(&self, key: &str) -> Result<Vec<KeyedRecord>> {
        parse(&self.contract.evaluate_transaction("getHistory", &[key]).await?)
    }

    /// Index entries of `key` with the given data type
    pub async fn get_history_by_data_type(&self, key: &str, data_type: &str) -> Result<Vec<KeyedRecord>> {
        parse(&self.contract.evaluate_transaction("getHistoryByDataType", &[key, data_type]).await?)
    }

    /// Modification history of the value at `key`, newest first
    pub async fn get_key_history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        parse(&self.contract.evaluate_transaction("getKeyHistory", &[key]).await?)
    }

    /// Delete a registered key
    pub async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        parse(&self.contract.submit_transaction("delete", &[key]).await?)
    }

    /// Store a share request at `key`
    pub async fn request_share(
        &self,
        key: &str,
        owner: &str,
        viewer: &str,
        data_type: &str,
        share_fields: &[String],
    ) -> Result<ShareRequest> {
        let share_fields = serde_json::to_string(share_fields)?;
        parse(
            &self.contract
                .submit_transaction("requestShare", &[key, owner, viewer, data_type, &share_fields])
                .await?,
        )
    }

    /// Run the ledger initialisation hook
    pub async fn init_ledger(&self) -> Result<()> {
        self.contract.submit_transaction("InitLedger", &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use meddata_core::models::RegisterOutcome;
    use meddata_core::{default_registry, CoreConfig, Ledger};
    use mockito::Matcher;
    use serde_json::json;

    use crate::gateway::Gateway;
    use crate::transport::{ClientError, LocalTransport};

    fn local_client() -> MedDataClient {
        let ledger = Ledger::new(default_registry(Arc::new(CoreConfig::testing())).unwrap());
        let gateway = Gateway::with_transport(Arc::new(LocalTransport::new(Arc::new(ledger))));
        let contract = gateway.network("ttchannel").unwrap().contract("ttdata").unwrap();
        MedDataClient::new(contract)
    }

    #[tokio::test]
    async fn test_register_upload_and_history() {
        let client = local_client();
        client.init_ledger().await.unwrap();

        let first = client.register("dev-1").await.unwrap();
        let second = client.register("dev-1").await.unwrap();
        assert_eq!(first.result, RegisterOutcome::Success);
        assert_eq!(second.result, RegisterOutcome::Exists);
        assert_eq!(client.query_key("dev-1").await.unwrap(), first.hash);

        for sub_key in ["a", "b"] {
            client.upload_data("dev-1", sub_key, "ecg", "h").await.unwrap();
        }
        assert!(client.check_by_subkey("dev-1", "a").await.unwrap().result);
        assert_eq!(client.query_by_subkey("dev-1", "b").await.unwrap().sub_key, "b");
        assert_eq!(client.get_history("dev-1").await.unwrap().len(), 2);
        assert_eq!(client.get_history_by_data_type("dev-1", "ecg").await.unwrap().len(), 2);

        let page = client.get_data_by_range_with_pagination("", "", 10, "").await.unwrap();
        assert_eq!(page.metadata.records_count, 1);

        let selector = r#"{"selector":{"dataType":"ecg"}}"#;
        assert_eq!(client.query_data(selector).await.unwrap().len(), 2);
        let page = client.query_data_with_pagination(selector, 1, "").await.unwrap();
        assert_eq!(page.result.len(), 1);
        assert!(!page.bookmark.is_empty());
    }

    #[tokio::test]
    async fn test_share_delete_and_key_history() {
        let client = local_client();
        client.register("dev-1").await.unwrap();

        let fields = vec!["heartRate".to_string(), "age".to_string()];
        let request = client.request_share("share-1", "alice", "bob", "ecg", &fields).await.unwrap();
        assert_eq!(request.share_fields, fields);

        assert!(client.delete("dev-1").await.unwrap().result);
        let history = client.get_key_history("dev-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_delete);

        let err = client.query_key("dev-1").await.unwrap_err();
        assert_eq!(err.kind(), Some("NotFound"));
    }

    #[tokio::test]
    async fn test_register_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/submit")
            .match_body(Matcher::Json(json!({"function": "register", "args": ["dev-9"]})))
            .with_status(200)
            .with_header("x-transaction-id", "tx-9")
            .with_body(r#"{"result":"success","hash":"tx-9"}"#)
            .create_async()
            .await;

        let contract = Gateway::connect(&server.url())
            .network("ttchannel")
            .unwrap()
            .contract("ttdata")
            .unwrap();
        let response = MedDataClient::new(contract).register("dev-9").await.unwrap();

        assert_eq!(response.hash, "tx-9");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_payload_is_json_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/evaluate")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let contract = Gateway::connect(&server.url())
            .network("ttchannel")
            .unwrap()
            .contract("ttdata")
            .unwrap();
        let err = MedDataClient::new(contract).check_by_subkey("dev-1", "a").await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
