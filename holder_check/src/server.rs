use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::{Filter, Rejection, Reply};

use crate::error::{ErrorKind, HolderError};
use crate::pipeline::{get_holders_classification, MAX_LIMIT};
use crate::registry::KnownAddressRegistry;
use crate::rpc::HeliusRpc;
use crate::wallet::{get_balance, get_wallet_portfolio};

pub struct AppContext {
    pub rpc: Arc<dyn HeliusRpc>,
    pub registry: &'static KnownAddressRegistry,
    pub default_limit: usize,
    pub max_pages: Option<u32>,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ok<T: Serialize>(data: T) -> WithStatus<Json> {
    let body = ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    };
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

fn fail(status: StatusCode, message: impl Into<String>) -> WithStatus<Json> {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(message.into()),
    };
    warp::reply::with_status(warp::reply::json(&body), status)
}

fn status_for(err: &HolderError) -> StatusCode {
    match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidMint => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Budget => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Upstream | ErrorKind::Malformed => StatusCode::BAD_GATEWAY,
    }
}

fn with_context(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (Arc<AppContext>,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

pub fn routes(
    ctx: Arc<AppContext>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&json!("ok")));

    let holders = warp::path("holders")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_context(ctx.clone()))
        .and_then(handle_holders);

    let balance = warp::path!("wallet" / String / "balance")
        .and(warp::get())
        .and(with_context(ctx.clone()))
        .and_then(handle_balance);

    let portfolio = warp::path!("wallet" / String / "portfolio")
        .and(warp::get())
        .and(with_context(ctx))
        .and_then(handle_portfolio);

    health
        .or(holders)
        .or(balance)
        .or(portfolio)
        .with(warp::cors().allow_any_origin())
}

async fn handle_holders(
    params: HashMap<String, String>,
    ctx: Arc<AppContext>,
) -> Result<WithStatus<Json>, Rejection> {
    let mint = match params.get("mint") {
        Some(mint) if Pubkey::from_str(mint).is_ok() => mint.clone(),
        Some(mint) => return Ok(fail(StatusCode::BAD_REQUEST, format!("invalid mint address: {}", mint))),
        None => return Ok(fail(StatusCode::BAD_REQUEST, "missing mint parameter")),
    };

    let limit = match params.get("limit").map(|l| l.parse::<usize>()) {
        None => ctx.default_limit,
        Some(Ok(limit)) if (1..=MAX_LIMIT).contains(&limit) => limit,
        Some(_) => {
            return Ok(fail(
                StatusCode::BAD_REQUEST,
                format!("limit must be between 1 and {}", MAX_LIMIT),
            ))
        }
    };

    match get_holders_classification(ctx.rpc.as_ref(), ctx.registry, &mint, limit, ctx.max_pages).await {
        Ok(result) => {
            info!(
                "Token Address: {}, holders: {}, top: {}",
                mint,
                result.total_holders,
                result.top_holders.len()
            );
            Ok(ok(result))
        }
        Err(e) => {
            warn!("holder classification failed for {}: {}", mint, e);
            Ok(fail(status_for(&e), e.to_string()))
        }
    }
}

async fn handle_balance(address: String, ctx: Arc<AppContext>) -> Result<WithStatus<Json>, Rejection> {
    if Pubkey::from_str(&address).is_err() {
        return Ok(fail(StatusCode::BAD_REQUEST, format!("invalid wallet address: {}", address)));
    }
    match get_balance(ctx.rpc.as_ref(), &address).await {
        Ok(balance) => Ok(ok(json!({ "address": address, "balance": balance }))),
        Err(e) => {
            warn!("balance lookup failed for {}: {}", address, e);
            Ok(fail(status_for(&e), e.to_string()))
        }
    }
}

async fn handle_portfolio(address: String, ctx: Arc<AppContext>) -> Result<WithStatus<Json>, Rejection> {
    if Pubkey::from_str(&address).is_err() {
        return Ok(fail(StatusCode::BAD_REQUEST, format!("invalid wallet address: {}", address)));
    }
    match get_wallet_portfolio(ctx.rpc.as_ref(), &address).await {
        Ok(portfolio) => Ok(ok(portfolio)),
        Err(e) => {
            warn!("portfolio lookup failed for {}: {}", address, e);
            Ok(fail(status_for(&e), e.to_string()))
        }
    }
}
