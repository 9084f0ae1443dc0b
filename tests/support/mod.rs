//! In-memory ledger node for driving the monitor without bitcoind.

#![allow(dead_code)]

use async_trait::async_trait;
use feebump::rpc::Endpoint;
use feebump::{LedgerRpc, RpcError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: Endpoint,
    pub method: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct State {
    height: Option<u64>,
    wallets: Vec<String>,
    unspent: HashMap<String, Option<Vec<Value>>>,
    transactions: HashMap<String, Option<(f64, String)>>,
    failing_bumps: HashMap<String, Value>,
    prioritise_failures: usize,
    calls: Vec<Call>,
}

/// Scripted responses keyed by wallet and txid. Every call is recorded.
#[derive(Default)]
pub struct ScriptedLedger {
    state: Mutex<State>,
}

fn not_found(what: &str) -> RpcError {
    RpcError::Protocol { code: -5, message: format!("{} not found", what) }
}

/// Raw transaction hex of `bytes` bytes.
pub fn hex_of(bytes: usize) -> String {
    "ab".repeat(bytes)
}

impl ScriptedLedger {
    pub fn new(height: u64, wallets: &[&str]) -> Self {
        let ledger = Self::default();
        {
            let mut s = ledger.state.lock().unwrap();
            s.height = Some(height);
            s.wallets = wallets.iter().map(|w| w.to_string()).collect();
            for w in wallets {
                s.unspent.insert(w.to_string(), Some(Vec::new()));
            }
        }
        ledger
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().height = Some(height);
    }

    pub fn fail_height(&self) {
        self.state.lock().unwrap().height = None;
    }

    pub fn add_wallet(&self, wallet: &str) {
        let mut s = self.state.lock().unwrap();
        s.wallets.push(wallet.to_string());
        s.unspent.insert(wallet.to_string(), Some(Vec::new()));
    }

    /// Unconfirmed outputs of `wallet`, one per txid, in order.
    pub fn set_unspent(&self, wallet: &str, txids: &[&str]) {
        let entries = txids
            .iter()
            .enumerate()
            .map(|(vout, txid)| json!({"txid": txid, "vout": vout, "amount": 0.001, "confirmations": 0}))
            .collect();
        self.state.lock().unwrap().unspent.insert(wallet.to_string(), Some(entries));
    }

    pub fn set_unspent_raw(&self, wallet: &str, entries: Vec<Value>) {
        self.state.lock().unwrap().unspent.insert(wallet.to_string(), Some(entries));
    }

    pub fn fail_unspent(&self, wallet: &str) {
        self.state.lock().unwrap().unspent.insert(wallet.to_string(), None);
    }

    pub fn set_transaction(&self, txid: &str, fee_btc: f64, hex: String) {
        self.state.lock().unwrap().transactions.insert(txid.to_string(), Some((fee_btc, hex)));
    }

    pub fn fail_transaction(&self, txid: &str) {
        self.state.lock().unwrap().transactions.insert(txid.to_string(), None);
    }

    /// Make `bumpfee` for `txid` answer with `result` instead of a replacement.
    pub fn fail_bump(&self, txid: &str, result: Value) {
        self.state.lock().unwrap().failing_bumps.insert(txid.to_string(), result);
    }

    pub fn clear_bump_failure(&self, txid: &str) {
        self.state.lock().unwrap().failing_bumps.remove(txid);
    }

    /// The next `n` prioritisetransaction calls fail.
    pub fn fail_prioritise(&self, n: usize) {
        self.state.lock().unwrap().prioritise_failures = n;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.method == method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }

    fn respond(&self, endpoint: &Endpoint, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let mut s = self.state.lock().unwrap();
        let wallet = match endpoint {
            Endpoint::Wallet(name) => Some(name.clone()),
            Endpoint::Node => None,
        };
        let txid = params.first().and_then(Value::as_str).unwrap_or_default().to_string();

        match method {
            "listwallets" => Ok(json!(s.wallets)),
            "getblockcount" => s
                .height
                .map(|h| json!(h))
                .ok_or_else(|| RpcError::transport("connection refused")),
            "listunspent" => {
                let wallet = wallet.ok_or_else(|| not_found("wallet"))?;
                match s.unspent.get(&wallet) {
                    Some(Some(entries)) => Ok(Value::Array(entries.clone())),
                    Some(None) => Err(RpcError::transport("connection reset")),
                    None => Err(RpcError::Protocol { code: -18, message: "Requested wallet does not exist or is not loaded".into() }),
                }
            }
            "gettransaction" => match s.transactions.get(&txid) {
                Some(Some((fee, hex))) => Ok(json!({"txid": txid, "fee": fee, "hex": hex, "confirmations": 0})),
                Some(None) | None => Err(not_found("transaction")),
            },
            "bumpfee" => match s.failing_bumps.get(&txid) {
                Some(Value::Null) => Err(RpcError::Protocol { code: -8, message: "Insufficient total fee".into() }),
                Some(result) => Ok(result.clone()),
                None => Ok(json!({"txid": format!("{}-r", txid), "origfee": 0.0001, "fee": 0.0002, "errors": []})),
            },
            "prioritisetransaction" => {
                if s.prioritise_failures > 0 {
                    s.prioritise_failures -= 1;
                    Err(RpcError::transport("connection refused"))
                } else {
                    Ok(json!(true))
                }
            }
            other => Err(RpcError::Protocol { code: -32601, message: format!("Method not found: {}", other) }),
        }
    }
}

#[async_trait]
impl LedgerRpc for ScriptedLedger {
    async fn call(&self, endpoint: &Endpoint, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let result = self.respond(endpoint, method, &params);
        self.state.lock().unwrap().calls.push(Call {
            endpoint: endpoint.clone(),
            method: method.to_string(),
            params,
        });
        result
    }
}
