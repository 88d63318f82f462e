use crate::config::NodeConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use powchain_core::{
    Block, CancelFlag, ChainFetcher, ChainSnapshot, ConsensusResolver, Ledger, LedgerError, Peer,
    PeerRegistry, Resolution, Transaction, TransactionRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Everything a request handler may touch. One instance per node.
pub struct AppState<F> {
    pub ledger: Arc<Ledger>,
    pub peers: Arc<PeerRegistry>,
    pub resolver: ConsensusResolver<F>,
    pub node_id: Arc<str>,
    /// Raised on shutdown; aborts in-flight proof searches.
    pub shutdown: CancelFlag,
    pub mine_retries: u32,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            peers: self.peers.clone(),
            resolver: self.resolver.clone(),
            node_id: self.node_id.clone(),
            shutdown: self.shutdown.clone(),
            mine_retries: self.mine_retries,
        }
    }
}

impl<F: ChainFetcher> AppState<F> {
    pub fn new(config: &NodeConfig, fetcher: F) -> Self {
        let peers = PeerRegistry::new();
        for peer in &config.peers {
            peers.insert(peer.clone());
        }
        Self {
            ledger: Arc::new(Ledger::with_strategy(config.strategy)),
            peers: Arc::new(peers),
            resolver: ConsensusResolver::new(fetcher, config.fetch_timeout),
            node_id: Arc::from(config.node_id.as_str()),
            shutdown: CancelFlag::new(),
            mine_retries: config.mine_retries.max(1),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InvalidInput(String),
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Ledger(LedgerError::Validation(_) | LedgerError::InvalidAddress(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Ledger(LedgerError::StaleTip) => StatusCode::CONFLICT,
            ApiError::Ledger(LedgerError::Aborted) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = match self {
            ApiError::Ledger(e) => e.to_string(),
            ApiError::InvalidInput(msg) | ApiError::Internal(msg) => msg,
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterNodes {
    pub nodes: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub outcome: Resolution,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

pub fn router<F: ChainFetcher>(state: AppState<F>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/chain", get(full_chain::<F>))
        .route("/mine", get(mine::<F>).post(mine::<F>))
        .route("/transactions/new", post(new_transaction::<F>))
        .route("/nodes", get(list_nodes::<F>))
        .route("/nodes/register", post(register_nodes::<F>))
        .route("/nodes/resolve", get(resolve::<F>).post(resolve::<F>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn full_chain<F>(State(state): State<AppState<F>>) -> Json<ChainSnapshot> {
    Json(state.ledger.snapshot())
}

async fn mine<F: ChainFetcher>(
    State(state): State<AppState<F>>,
) -> Result<Json<MineResponse>, ApiError> {
    let block = mine_with_retries(&state).await?;
    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

/// Mine a rewarded block off the async runtime, retrying when a chain
/// replacement invalidates the tip mid-search.
pub async fn mine_with_retries<F>(state: &AppState<F>) -> Result<Block, ApiError> {
    let mut attempt = 1;
    loop {
        let ledger = state.ledger.clone();
        let node_id = state.node_id.clone();
        let cancel = state.shutdown.clone();
        let result =
            tokio::task::spawn_blocking(move || ledger.mine_block_with_reward(&node_id, &cancel))
                .await
                .map_err(|e| ApiError::Internal(format!("mining task failed: {e}")))?;

        match result {
            Err(LedgerError::StaleTip) if attempt < state.mine_retries => {
                warn!(attempt, "tip replaced while mining, retrying");
                attempt += 1;
            }
            other => return Ok(other?),
        }
    }
}

async fn new_transaction<F>(
    State(state): State<AppState<F>>,
    Json(req): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let tx = req.into_transaction()?;
    let index = state.ledger.submit(tx);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Transaction will be added to Block {index}"),
        }),
    ))
}

async fn list_nodes<F>(State(state): State<AppState<F>>) -> Json<NodesResponse> {
    Json(NodesResponse {
        message: format!("{} known nodes", state.peers.len()),
        total_nodes: peer_strings(&state.peers),
    })
}

/// All addresses are parsed before any is stored, so one bad entry
/// rejects the whole request.
async fn register_nodes<F>(
    State(state): State<AppState<F>>,
    Json(req): Json<RegisterNodes>,
) -> Result<(StatusCode, Json<NodesResponse>), ApiError> {
    let nodes = match req.nodes {
        Some(nodes) if !nodes.is_empty() => nodes,
        _ => {
            return Err(ApiError::InvalidInput(
                "Please supply a valid list of nodes".to_string(),
            ))
        }
    };
    let parsed = nodes
        .iter()
        .map(|n| Peer::parse(n))
        .collect::<Result<Vec<_>, _>>()?;
    for peer in parsed {
        if state.peers.insert(peer.clone()) {
            info!(%peer, "registered peer");
        }
    }
    Ok((
        StatusCode::CREATED,
        Json(NodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: peer_strings(&state.peers),
        }),
    ))
}

async fn resolve<F: ChainFetcher>(State(state): State<AppState<F>>) -> Json<ResolveResponse> {
    let outcome = state.resolver.resolve(&state.ledger, &state.peers).await;
    let message = match outcome {
        Resolution::Replaced => "Our chain was replaced",
        Resolution::Unchanged => "Our chain is authoritative",
    };
    Json(ResolveResponse {
        message: message.to_string(),
        outcome,
        chain: state.ledger.chain(),
    })
}

fn peer_strings(peers: &PeerRegistry) -> Vec<String> {
    peers.list().iter().map(ToString::to_string).collect()
}
