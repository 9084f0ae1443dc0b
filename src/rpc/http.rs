//! HttpRpcClient - reqwest transport for the ledger node

use super::{Endpoint, LedgerRpc, RpcRequest, RpcResponse};
use crate::config::RpcConfig;
use crate::error::RpcError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Authenticated JSON-RPC client bound to one node.
///
/// Without `timeout_secs` a hanging node blocks the caller indefinitely.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpRpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            http: builder.build()?,
            base_url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LedgerRpc for HttpRpcClient {
    async fn call(&self, endpoint: &Endpoint, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let url = endpoint.url(&self.base_url);
        tracing::trace!(%url, method, "rpc request");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&RpcRequest::new(method, &params))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        // bitcoind answers RPC errors with HTTP 500 and a normal envelope,
        // so the envelope is checked before the status.
        match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(RpcError::transport(format!("HTTP {} from {}", status, url))),
            Err(err) => Err(RpcError::schema(method, err)),
        }
    }
}
