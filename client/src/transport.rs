//! Ledger session transport
//!
//! A transport carries one invocation to a ledger endpoint and brings back the
//! raw payload. `HttpTransport` talks to a `meddata-peer` over HTTP;
//! `LocalTransport` runs invocations against an in-process `Ledger`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use meddata_core::{CoreError, Invocation, Ledger};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Header carrying the id of a committed transaction
pub const TRANSACTION_ID_HEADER: &str = "x-transaction-id";

/// Error type for client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The ledger rejected the invocation
    #[error("Server error ({status}, {kind}): {message}")]
    Server {
        /// HTTP status of the response
        status: u16,

        /// Error kind reported by the ledger
        kind: String,

        /// Error message reported by the ledger
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invocation failed in an in-process ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] CoreError),

    /// Session misuse, e.g. an unknown network or contract handle
    #[error("Session error: {0}")]
    Session(String),
}

impl ClientError {
    /// Error kind reported by the ledger, when there is one
    pub fn kind(&self) -> Option<&str> {
        match self {
            ClientError::Server { kind, .. } => Some(kind.as_str()),
            ClientError::Ledger(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// Payload returned by the operation
    pub payload: Vec<u8>,

    /// Id of the committed transaction, when the endpoint reports it
    pub tx_id: Option<String>,
}

/// Carries invocations to a ledger
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Run a query; nothing is committed
    async fn evaluate(&self, channel: &str, chaincode: &str, invocation: &Invocation) -> Result<Vec<u8>>;

    /// Run a transaction and wait for its commit
    async fn submit(&self, channel: &str, chaincode: &str, invocation: &Invocation) -> Result<Submitted>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    kind: String,
}

/// Transport to a peer's HTTP API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of the peer
    base_url: String,

    /// HTTP client
    client: Client,

    /// Timeout for requests
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the peer at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the timeout for requests
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Base URL of the peer
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, channel: &str, chaincode: &str, action: &str) -> String {
        format!(
            "{}/api/v1/channels/{}/chaincodes/{}/{}",
            self.base_url, channel, chaincode, action
        )
    }

    async fn post(&self, url: &str, invocation: &Invocation) -> Result<reqwest::Response> {
        debug!("POST {} ({})", url, invocation.function);
        let response = self.client
            .post(url)
            .json(invocation)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        Ok(response)
    }
}

async fn server_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(_) => String::new(),
    };

    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Server {
            status: status.as_u16(),
            kind: body.kind,
            message: body.error,
        },
        Err(_) => ClientError::Server {
            status: status.as_u16(),
            kind: String::new(),
            message: if text.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                text
            },
        },
    }
}

#[async_trait]
impl LedgerTransport for HttpTransport {
    async fn evaluate(&self, channel: &str, chaincode: &str, invocation: &Invocation) -> Result<Vec<u8>> {
        let url = self.endpoint(channel, chaincode, "evaluate");
        let response = self.post(&url, invocation).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn submit(&self, channel: &str, chaincode: &str, invocation: &Invocation) -> Result<Submitted> {
        let url = self.endpoint(channel, chaincode, "submit");
        let response = self.post(&url, invocation).await?;

        let tx_id = response
            .headers()
            .get(TRANSACTION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let payload = response.bytes().await?.to_vec();
        Ok(Submitted { payload, tx_id })
    }
}

/// Transport running invocations against an in-process ledger
///
/// The channel and chaincode names are ignored; the ledger hosts exactly one
/// chaincode.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    ledger: Arc<Ledger>,
}

impl LocalTransport {
    /// Wrap a ledger
    pub fn new(ledger: Arc<Ledger>) -> Self {
        LocalTransport { ledger }
    }
}

#[async_trait]
impl LedgerTransport for LocalTransport {
    async fn evaluate(&self, _channel: &str, _chaincode: &str, invocation: &Invocation) -> Result<Vec<u8>> {
        Ok(self.ledger.evaluate(invocation)?)
    }

    async fn submit(&self, _channel: &str, _chaincode: &str, invocation: &Invocation) -> Result<Submitted> {
        let result = self.ledger.submit(invocation)?;
        Ok(Submitted {
            payload: result.payload,
            tx_id: Some(result.tx_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_evaluate_posts_invocation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/evaluate")
            .match_body(Matcher::Json(json!({"function": "queryKey", "args": ["dev-1"]})))
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body("tx-abc")
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url());
        let payload = transport
            .evaluate("ttchannel", "ttdata", &Invocation::new("queryKey", &["dev-1"]))
            .await
            .unwrap();

        assert_eq!(payload, b"tx-abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_reads_transaction_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/submit")
            .with_status(200)
            .with_header(TRANSACTION_ID_HEADER, "0123abcd")
            .with_body(r#"{"result":"success","hash":"0123abcd"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(&format!("{}/", server.url()));
        let submitted = transport
            .submit("ttchannel", "ttdata", &Invocation::new("register", &["dev-1"]))
            .await
            .unwrap();

        assert_eq!(submitted.tx_id.as_deref(), Some("0123abcd"));
    }

    #[tokio::test]
    async fn test_server_errors_carry_kind() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/submit")
            .with_status(409)
            .with_body(r#"{"error":"Commit conflict: read of dev-1","kind":"CommitConflict"}"#)
            .create_async()
            .await;
        let _plain = server
            .mock("POST", "/api/v1/channels/ttchannel/chaincodes/ttdata/evaluate")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let transport = HttpTransport::new(&server.url());
        let err = transport
            .submit("ttchannel", "ttdata", &Invocation::new("register", &["dev-1"]))
            .await
            .unwrap_err();
        match &err {
            ClientError::Server { status, message, .. } => {
                assert_eq!(*status, 409);
                assert!(message.contains("dev-1"));
            }
            other => panic!("Expected Server error, got {:?}", other),
        }
        assert_eq!(err.kind(), Some("CommitConflict"));

        let err = transport
            .evaluate("ttchannel", "ttdata", &Invocation::new("queryKey", &["dev-1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 502, ref message, .. } if message == "bad gateway"));
        assert_eq!(err.kind(), Some(""));
    }
}
