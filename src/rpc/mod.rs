//! Ledger RPC - JSON-RPC 1.0 over HTTP against the ledger node
//!
//! # Layers
//!
//! ```text
//! Ledger<R>            typed calls: listwallets, getblockcount, listunspent,
//!   │                  gettransaction, bumpfee, prioritisetransaction
//!   │
//!   └── R: LedgerRpc   untyped call(endpoint, method, params) -> Value
//!         │
//!         └── HttpRpcClient (reqwest, Basic auth)
//! ```
//!
//! Node-scoped calls go to `{base}`, wallet-scoped calls to
//! `{base}/wallet/{name}`.

mod http;
mod methods;

pub use http::HttpRpcClient;
pub use methods::{BumpFeeResult, Ledger, UnspentList, UnspentOutput, WalletTransaction};

use crate::error::RpcError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a call is routed on the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Node,
    Wallet(String),
}

impl Endpoint {
    pub fn wallet(name: impl Into<String>) -> Self {
        Endpoint::Wallet(name.into())
    }

    /// Wallet names are percent-encoded as a single path segment.
    pub fn url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let Endpoint::Wallet(name) = self else { return base.to_string() };
        match reqwest::Url::parse(base) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push("wallet").push(name);
                }
                url.into()
            }
            // Left for reqwest to reject with a transport error.
            Err(_) => format!("{}/wallet/{}", base, name),
        }
    }
}

/// Untyped request/response exchange with the ledger node.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn call(&self, endpoint: &Endpoint, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;
}

#[async_trait]
impl<T: LedgerRpc + ?Sized> LedgerRpc for std::sync::Arc<T> {
    async fn call(&self, endpoint: &Endpoint, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        (**self).call(endpoint, method, params).await
    }
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: &'a str,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a [Value]) -> Self {
        Self { jsonrpc: "1.0", id: method, method, params }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) => Err(RpcError::Protocol { code: err.code, message: err.message }),
            None => Ok(self.result),
        }
    }
}
