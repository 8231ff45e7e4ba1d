//! REST request layer for ProofLedger
//!
//! A thin axum router over [`LedgerNode`]. The caller's identity arrives in
//! the `x-ledger-identity` header, set by whatever identity provider sits in
//! front of this service; requests without it are denied before they reach
//! a ledger.

use axum::{
    extract::{Request, State},
    http::{self, HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::{Block, LedgerSnapshot};
use crate::error::LedgerError;
use crate::guard::{require_identity, Identity};
use crate::node::{LedgerNode, Status};

pub const IDENTITY_HEADER: &str = "x-ledger-identity";

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InvalidInput(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(LedgerError::MissingIdentity) => {
                (StatusCode::UNAUTHORIZED, LedgerError::MissingIdentity.to_string())
            }
            ApiError::Ledger(
                e @ (LedgerError::DatabaseError(_) | LedgerError::SerializationError(_) | LedgerError::IoError(_)),
            ) => {
                tracing::error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.".to_string())
            }
            ApiError::Ledger(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

/// The `{status, message, ref}` triple every mutating endpoint answers with.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub status: Status,
    pub message: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

impl ApiMessage {
    fn ok(message: impl Into<String>, reference: &str) -> Self {
        ApiMessage {
            status: Status::Ok,
            message: message.into(),
            reference: reference.to_string(),
            block_index: None,
            block: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MineRequest {
    #[serde(alias = "lastproof")]
    pub last_proof: String,
    pub proof: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub recipient: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct PeerRequest {
    pub node: String,
}

// ============================================================================
// Middleware
// ============================================================================

async fn identity_guard(mut req: Request, next: Next) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok());
    let identity = require_identity(raw)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<LedgerNode>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "difficulty": node.pow().difficulty(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn get_ledger(
    State(node): State<Arc<LedgerNode>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<LedgerSnapshot>, ApiError> {
    Ok(Json(node.snapshot(&identity)?))
}

async fn mine(
    State(node): State<Arc<LedgerNode>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<MineRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let receipt = node.mine(&identity, &req.last_proof, &req.proof)?;
    Ok(Json(ApiMessage {
        status: receipt.status,
        message: receipt.message,
        reference: "mine".to_string(),
        block_index: receipt.block.as_ref().map(|b| b.index),
        block: receipt.block,
    }))
}

async fn submit_transaction(
    State(node): State<Arc<LedgerNode>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<TransactionRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let recipient = req.recipient.trim();
    if recipient.is_empty() {
        return Err(ApiError::InvalidInput("Recipient cannot be empty".to_string()));
    }
    let index = node.submit_transaction(&identity, recipient, req.amount)?;
    let mut message = ApiMessage::ok(format!("Sent {} coins to {}", req.amount, recipient), "trans");
    message.block_index = Some(index);
    Ok(Json(message))
}

async fn add_peer(
    State(node): State<Arc<LedgerNode>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PeerRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let peer = req.node.trim();
    if peer.is_empty() {
        return Err(ApiError::InvalidInput("Peer identifier cannot be empty".to_string()));
    }
    node.add_peer(&identity, peer)?;
    Ok(Json(ApiMessage::ok(format!("Neighbor {} is added.", peer), "neighbor")))
}

async fn consensus(
    State(node): State<Arc<LedgerNode>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiMessage>, ApiError> {
    let replaced = node.resolve(&identity)?;
    let message = if replaced { "Your chain is updated." } else { "No update." };
    Ok(Json(ApiMessage::ok(message, "consensus")))
}

// ============================================================================
// Router
// ============================================================================

pub fn build_api_router(node: Arc<LedgerNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![
            http::header::CONTENT_TYPE,
            HeaderName::from_static(IDENTITY_HEADER),
        ]);

    let guarded = Router::new()
        .route("/ledger", get(get_ledger))
        .route("/mine", post(mine))
        .route("/transaction", post(submit_transaction))
        .route("/peers", post(add_peer))
        .route("/consensus", post(consensus))
        .route_layer(middleware::from_fn(identity_guard));

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .merge(guarded)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(node: Arc<LedgerNode>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
