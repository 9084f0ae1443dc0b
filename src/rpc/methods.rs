//! Typed ledger calls. One response struct per method; any shape mismatch
//! becomes `RpcError::Schema`.

use super::{Endpoint, LedgerRpc};
use crate::error::RpcError;
use bitcoin::Amount;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// One entry of `listunspent`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    #[serde(default)]
    pub vout: u32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub confirmations: i64,
}

/// `listunspent` result. Malformed entries are counted, not fatal.
#[derive(Debug, Clone, Default)]
pub struct UnspentList {
    pub outputs: Vec<UnspentOutput>,
    pub malformed: usize,
}

impl UnspentList {
    /// Distinct txids in first-seen order.
    pub fn txids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.outputs
            .iter()
            .map(|o| o.txid.as_str())
            .filter(|txid| seen.insert(*txid))
            .collect()
    }
}

/// Subset of `gettransaction` used for fee estimation.
///
/// `fee` is only reported for transactions the wallet sent; for anything
/// else decoding fails and the transaction is skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletTransaction {
    pub fee: f64,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BumpFeeResult {
    pub txid: String,
    #[serde(default)]
    pub origfee: Option<f64>,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Typed facade over a [`LedgerRpc`] transport.
#[derive(Debug, Clone)]
pub struct Ledger<R> {
    rpc: R,
}

impl<R: LedgerRpc> Ledger<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    async fn request<T: DeserializeOwned>(&self, endpoint: &Endpoint, method: &str, params: Vec<Value>) -> Result<T, RpcError> {
        let value = self.rpc.call(endpoint, method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::schema(method, e))
    }

    pub async fn list_wallets(&self) -> Result<Vec<String>, RpcError> {
        self.request(&Endpoint::Node, "listwallets", vec![]).await
    }

    pub async fn block_count(&self) -> Result<u64, RpcError> {
        self.request(&Endpoint::Node, "getblockcount", vec![]).await
    }

    /// Zero-confirmation outputs of `wallet` worth at least `minimum_amount`.
    pub async fn list_unconfirmed(&self, wallet: &str, minimum_amount: Amount) -> Result<UnspentList, RpcError> {
        let params = vec![
            json!(0),
            json!(0),
            json!(Vec::<String>::new()),
            json!(true),
            json!({"minimumAmount": minimum_amount.to_btc()}),
        ];
        let entries: Vec<Value> = self.request(&Endpoint::wallet(wallet), "listunspent", params).await?;

        let mut list = UnspentList::default();
        for entry in entries {
            match serde_json::from_value::<UnspentOutput>(entry) {
                Ok(output) => list.outputs.push(output),
                Err(err) => {
                    tracing::warn!(wallet, error = %err, "skipping malformed listunspent entry");
                    list.malformed += 1;
                }
            }
        }
        Ok(list)
    }

    pub async fn get_transaction(&self, wallet: &str, txid: &str) -> Result<WalletTransaction, RpcError> {
        self.request(&Endpoint::wallet(wallet), "gettransaction", vec![json!(txid)]).await
    }

    /// Replace `txid` with a copy paying `fee_rate` sat/vB.
    pub async fn bump_fee(&self, wallet: &str, txid: &str, fee_rate: u64) -> Result<BumpFeeResult, RpcError> {
        let params = vec![json!(txid), json!({"fee_rate": fee_rate})];
        self.request(&Endpoint::wallet(wallet), "bumpfee", params).await
    }

    /// Ask the node to mine `txid` as if it paid `fee_delta` extra satoshis.
    pub async fn prioritise_transaction(&self, txid: &str, fee_delta: i64) -> Result<bool, RpcError> {
        let params = vec![json!(txid), json!(0), json!(fee_delta)];
        self.request(&Endpoint::Node, "prioritisetransaction", params).await
    }
}
