//! JSON-RPC access to the Helius indexing endpoint.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::RpcError;

const REQUEST_ID: &str = "request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcMethod {
    SearchAssets,
    GetBalance,
    GetTokenAccounts,
    GetAccountInfo,
    GetMultipleAccounts,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::SearchAssets => "searchAssets",
            RpcMethod::GetBalance => "getBalance",
            RpcMethod::GetTokenAccounts => "getTokenAccounts",
            RpcMethod::GetAccountInfo => "getAccountInfo",
            RpcMethod::GetMultipleAccounts => "getMultipleAccounts",
        }
    }
}

/// One request in, the response's `result` member out.
///
/// Implementations send exactly one request per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeliusRpc: Send + Sync {
    async fn call(&self, method: RpcMethod, params: Value) -> Result<Value, RpcError>;
}

pub struct HeliusClient {
    rpc_url: String,
    client: Client,
}

impl HeliusClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            rpc_url: rpc_url.into(),
            client,
        })
    }
}

pub(crate) fn request_body(method: RpcMethod, params: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": REQUEST_ID,
        "method": method.as_str(),
        "params": params,
    })
}

/// Splits a decoded JSON-RPC envelope into its result or protocol error.
pub(crate) fn unwrap_envelope(mut body: Value) -> Result<Value, RpcError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(RpcError::Protocol { message });
    }
    Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
}

#[async_trait]
impl HeliusRpc for HeliusClient {
    async fn call(&self, method: RpcMethod, params: Value) -> Result<Value, RpcError> {
        debug!("rpc {} -> {}", method.as_str(), params);
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request_body(method, &params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body: Value = response.json().await?;
        unwrap_envelope(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use warp::http::StatusCode;
    use warp::Filter;

    /// Local endpoint answering every POST with `reply`; request bodies are recorded.
    fn serve(status: StatusCode, reply: Value) -> (HeliusClient, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let route = warp::post().and(warp::body::json()).map(move |body: Value| {
            log.lock().unwrap().push(body);
            warp::reply::with_status(warp::reply::json(&reply), status)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let client = HeliusClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        (client, seen)
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let (client, seen) = serve(StatusCode::SERVICE_UNAVAILABLE, json!({ "result": 1 }));
        let err = client.call(RpcMethod::GetBalance, json!(["W"])).await.unwrap_err();
        assert!(matches!(
            err,
            RpcError::Transport { status: 503, ref reason } if reason == "Service Unavailable"
        ));
        assert_eq!(err.to_string(), "Helius API error: 503 Service Unavailable");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn error_envelope_over_http_is_protocol_error() {
        let (client, seen) = serve(StatusCode::OK, json!({ "jsonrpc": "2.0", "error": { "message": "x" } }));
        let params = json!({ "page": 1, "limit": 1000, "mint": "M" });
        let err = client.call(RpcMethod::GetTokenAccounts, params.clone()).await.unwrap_err();
        assert!(matches!(err, RpcError::Protocol { ref message } if message == "x"));

        let sent = seen.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            json!({ "jsonrpc": "2.0", "id": "request-id", "method": "getTokenAccounts", "params": params })
        );
    }

    #[tokio::test]
    async fn result_over_http_is_returned() {
        let (client, _) = serve(StatusCode::OK, json!({ "jsonrpc": "2.0", "id": "request-id", "result": { "value": 7 } }));
        let result = client.call(RpcMethod::GetBalance, json!(["W"])).await.unwrap();
        assert_eq!(result, json!({ "value": 7 }));
    }

    #[test]
    fn request_body_uses_wire_method_names() {
        let body = request_body(RpcMethod::GetMultipleAccounts, &json!([["A"], { "encoding": "jsonParsed" }]));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], "request-id");
        assert_eq!(body["method"], "getMultipleAccounts");
        assert_eq!(body["params"][1]["encoding"], "jsonParsed");
        assert_eq!(serde_json::to_value(RpcMethod::GetTokenAccounts).unwrap(), "getTokenAccounts");
    }

    #[test]
    fn error_member_becomes_protocol_error() {
        let err = unwrap_envelope(json!({ "error": { "code": -32602, "message": "Invalid params" } })).unwrap_err();
        assert!(matches!(err, RpcError::Protocol { ref message } if message == "Invalid params"));
    }

    #[test]
    fn error_without_message_is_serialized_whole() {
        let err = unwrap_envelope(json!({ "error": { "code": 429 } })).unwrap_err();
        assert_eq!(err.to_string(), "Helius API error: {\"code\":429}");
    }

    #[test]
    fn result_member_is_returned() {
        let result = unwrap_envelope(json!({ "jsonrpc": "2.0", "result": { "value": 5 } })).unwrap();
        assert_eq!(result, json!({ "value": 5 }));
        assert_eq!(unwrap_envelope(json!({ "error": null })).unwrap(), Value::Null);
    }
}
