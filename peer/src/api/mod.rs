use axum::{
    Router,
    routing::{get, post},
    extract::{Path, State, Json as AxumJson},
    response::{IntoResponse, Json},
    http::{header, HeaderName},
};
use chrono::{DateTime, Utc};
use meddata_core::{Invocation, InvocationKind, Ledger};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::{PeerError, Result};

/// Header carrying the id of a committed transaction
pub const TRANSACTION_ID_HEADER: &str = "x-transaction-id";

const OCTET_STREAM: &str = "application/octet-stream";

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Ledger hosting the chaincode
    pub ledger: Arc<Ledger>,

    /// Name of the hosted channel
    pub channel: String,

    /// Name of the hosted chaincode
    pub chaincode: String,

    /// When the service started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// State for a ledger exposed as `channel` / `chaincode`
    pub fn new(ledger: Arc<Ledger>, channel: &str, chaincode: &str) -> Self {
        AppState {
            ledger,
            channel: channel.to_string(),
            chaincode: chaincode.to_string(),
            started_at: Utc::now(),
        }
    }

    fn check_target(&self, channel: &str, chaincode: &str) -> Result<()> {
        if channel != self.channel {
            return Err(PeerError::UnknownChannel(channel.to_string()));
        }
        if chaincode != self.chaincode {
            return Err(PeerError::UnknownChaincode(chaincode.to_string()));
        }
        Ok(())
    }
}

/// Create the API router with the specified state
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/api/v1/channels/:channel/chaincodes/:chaincode/evaluate", post(evaluate))
        .route("/api/v1/channels/:channel/chaincodes/:chaincode/submit", post(submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

#[derive(Debug, Serialize)]
struct ContractStatus {
    namespace: String,
    operations: Vec<OperationStatus>,
}

#[derive(Debug, Serialize)]
struct OperationStatus {
    name: &'static str,
    kind: InvocationKind,
}

/// Service status with the hosted contracts and their operations
async fn status(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    let registry = state.ledger.registry();
    let contracts: Vec<ContractStatus> = registry
        .namespaces()
        .into_iter()
        .map(|namespace| ContractStatus {
            operations: registry
                .operations(namespace)
                .unwrap_or_default()
                .into_iter()
                .map(|(name, kind)| OperationStatus { name, kind })
                .collect(),
            namespace: namespace.to_string(),
        })
        .collect();

    Ok(Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "peer",
        "channel": state.channel,
        "chaincode": state.chaincode,
        "height": state.ledger.world().height()?,
        "startedAt": state.started_at.to_rfc3339(),
        "contracts": contracts,
    })))
}

/// Run a query; nothing is committed
async fn evaluate(
    State(state): State<Arc<AppState>>,
    Path((channel, chaincode)): Path<(String, String)>,
    AxumJson(invocation): AxumJson<Invocation>,
) -> Result<impl IntoResponse> {
    state.check_target(&channel, &chaincode)?;
    tracing::debug!("evaluate {} on {}/{}", invocation.function, channel, chaincode);

    let payload = state.ledger.evaluate(&invocation)?;
    Ok(([(header::CONTENT_TYPE, OCTET_STREAM)], payload))
}

/// Run a transaction and commit its writes
async fn submit(
    State(state): State<Arc<AppState>>,
    Path((channel, chaincode)): Path<(String, String)>,
    AxumJson(invocation): AxumJson<Invocation>,
) -> Result<impl IntoResponse> {
    state.check_target(&channel, &chaincode)?;

    let result = state.ledger.submit(&invocation)?;
    tracing::info!(
        "submitted {} on {}/{} as {} (version {:?})",
        invocation.function, channel, chaincode, result.tx_id, result.version
    );
    let headers = [
        (header::CONTENT_TYPE, OCTET_STREAM.to_string()),
        (HeaderName::from_static(TRANSACTION_ID_HEADER), result.tx_id),
    ];
    Ok((headers, result.payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use meddata_core::{default_registry, CoreConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let ledger = Ledger::new(default_registry(Arc::new(CoreConfig::testing())).unwrap());
        create_router(Arc::new(AppState::new(Arc::new(ledger), "ttchannel", "ttdata")))
    }

    fn invoke(action: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/channels/ttchannel/chaincodes/ttdata/{}", action))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_lists_contracts() {
        let response = app()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let status: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(status["height"], 0);
        assert_eq!(status["contracts"][0]["namespace"], "org.ttdata.meddata");
        assert_eq!(status["contracts"][1]["namespace"], "org.ttdata.assettask");
    }

    #[tokio::test]
    async fn test_submit_then_evaluate() {
        let app = app();

        let response = app
            .clone()
            .oneshot(invoke("submit", json!({"function": "register", "args": ["dev-1"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], OCTET_STREAM);
        let tx_id = response
            .headers()
            .get(TRANSACTION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap();
        let registered: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(registered["hash"], tx_id.as_str());

        let response = app
            .oneshot(invoke("evaluate", json!({"function": "queryKey", "args": ["dev-1"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], OCTET_STREAM);
        assert_eq!(body_bytes(response).await, tx_id.into_bytes());
    }

    #[tokio::test]
    async fn test_contract_field_selects_namespace() {
        let app = app();
        app.clone()
            .oneshot(invoke("submit", json!({"contract": "org.ttdata.assettask", "function": "InitTask"})))
            .await
            .unwrap();

        let response = app
            .oneshot(invoke("evaluate", json!({"function": "org.ttdata.assettask:TaskExists", "args": ["Task-1"]})))
            .await
            .unwrap();
        assert_eq!(body_bytes(response).await, b"true");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let cases = [
            (json!({"function": "queryKey", "args": ["missing"]}), StatusCode::NOT_FOUND, "NotFound"),
            (json!({"function": "queryBySubkey", "args": ["dev-1"]}), StatusCode::BAD_REQUEST, "InvalidArgument"),
            (json!({"function": "noSuchOp"}), StatusCode::BAD_REQUEST, "UnknownFunction"),
        ];
        for (body, expected, kind) in cases {
            let response = app.clone().oneshot(invoke("evaluate", body)).await.unwrap();
            assert_eq!(response.status(), expected);
            let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert_eq!(error["kind"], kind);
        }
    }

    #[tokio::test]
    async fn test_unknown_chaincode_is_not_found() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/channels/ttchannel/chaincodes/other/evaluate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"function":"queryKey","args":["dev-1"]}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let error: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error["kind"], "UnknownChaincode");
    }
}
