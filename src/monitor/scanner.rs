//! Wallet enumeration and the unconfirmed-output scan.

use crate::rpc::{Ledger, LedgerRpc, UnspentList};
use crate::error::RpcError;
use bitcoin::Amount;
use tracing::{error, info};

/// Wallets loaded on the node. Errors are logged and yield an empty list;
/// callers enumerate once and keep the result.
pub async fn enumerate_wallets<R: LedgerRpc>(ledger: &Ledger<R>) -> Vec<String> {
    match ledger.list_wallets().await {
        Ok(wallets) => {
            info!(count = wallets.len(), wallets = ?wallets, "node wallets");
            wallets
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "listing wallets failed");
            Vec::new()
        }
    }
}

/// Lists zero-confirmation outputs above the dust threshold.
#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    minimum_amount: Amount,
}

impl Scanner {
    pub fn new(minimum_amount: Amount) -> Self {
        Self { minimum_amount }
    }

    pub fn minimum_amount(&self) -> Amount {
        self.minimum_amount
    }

    pub async fn scan<R: LedgerRpc>(&self, ledger: &Ledger<R>, wallet: &str) -> Result<UnspentList, RpcError> {
        ledger.list_unconfirmed(wallet, self.minimum_amount).await
    }
}
