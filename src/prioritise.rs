//! Prioritisation broadcaster
//!
//! Every cycle, each unconfirmed wallet transaction is announced to every
//! configured mining node with `prioritisetransaction`, so those nodes select
//! it as if it paid `fee_delta_sat` more. Nothing is remembered between cycles.

use crate::config::PrioritiseConfig;
use crate::monitor::{enumerate_wallets, Scanner};
use crate::rpc::{HttpRpcClient, Ledger, LedgerRpc};
use crate::runtime::pause;
use crate::error::RpcError;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// A node that receives fee deltas, labelled for logs.
#[derive(Debug, Clone)]
pub struct MiningNode<R> {
    pub label: String,
    pub ledger: Ledger<R>,
}

impl<R> MiningNode<R> {
    pub fn new(label: impl Into<String>, rpc: R) -> Self
    where
        R: LedgerRpc,
    {
        Self { label: label.into(), ledger: Ledger::new(rpc) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrioritiseReport {
    pub cycle: u64,
    pub transactions: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Prioritiser<R> {
    source: Ledger<R>,
    nodes: Vec<MiningNode<R>>,
    wallets: Vec<String>,
    scanner: Scanner,
    fee_delta: i64,
    interval: Duration,
    cycle: u64,
}

impl Prioritiser<HttpRpcClient> {
    /// HTTP clients for the scanning node and every mining node.
    pub async fn connect(source: Ledger<HttpRpcClient>, config: &PrioritiseConfig) -> Result<Self, RpcError> {
        let nodes = config
            .nodes
            .iter()
            .map(|node| Ok(MiningNode::new(node.url.clone(), HttpRpcClient::new(node)?)))
            .collect::<Result<Vec<_>, RpcError>>()?;
        Ok(Self::start(source, nodes, config).await)
    }
}

impl<R: LedgerRpc> Prioritiser<R> {
    /// Enumerate the source node's wallets once.
    pub async fn start(source: Ledger<R>, nodes: Vec<MiningNode<R>>, config: &PrioritiseConfig) -> Self {
        let wallets = enumerate_wallets(&source).await;
        Self {
            source,
            nodes,
            wallets,
            scanner: Scanner::new(config.minimum_amount()),
            fee_delta: config.fee_delta_sat,
            interval: config.check_interval(),
            cycle: 0,
        }
    }

    pub fn wallets(&self) -> &[String] {
        &self.wallets
    }

    pub fn nodes(&self) -> &[MiningNode<R>] {
        &self.nodes
    }

    pub async fn run_cycle(&mut self) -> PrioritiseReport {
        self.cycle += 1;
        let mut report = PrioritiseReport { cycle: self.cycle, ..Default::default() };
        info!(cycle = self.cycle, "prioritisation cycle");

        for wallet in &self.wallets {
            let unspent = match self.scanner.scan(&self.source, wallet).await {
                Ok(list) => list,
                Err(e) => {
                    error!(wallet, error = %e, kind = e.kind(), "listing unconfirmed outputs failed");
                    continue;
                }
            };
            for txid in unspent.txids() {
                report.transactions += 1;
                for node in &self.nodes {
                    report.attempted += 1;
                    match node.ledger.prioritise_transaction(txid, self.fee_delta).await {
                        Ok(true) => {
                            debug!(wallet, txid, node = %node.label, fee_delta = self.fee_delta, "prioritised");
                            report.succeeded += 1;
                        }
                        Ok(false) => {
                            warn!(wallet, txid, node = %node.label, "prioritisetransaction returned false");
                            report.failed += 1;
                        }
                        Err(e) => {
                            error!(wallet, txid, node = %node.label, error = %e, kind = e.kind(), "prioritisetransaction failed");
                            report.failed += 1;
                        }
                    }
                }
            }
        }
        report
    }

    pub async fn run(mut self, mut shutdown: Option<broadcast::Receiver<()>>) {
        info!(
            wallets = ?self.wallets,
            nodes = self.nodes.len(),
            fee_delta = self.fee_delta,
            check_secs = self.interval.as_secs(),
            "prioritisation broadcaster started"
        );
        loop {
            let report = self.run_cycle().await;
            info!(
                cycle = report.cycle,
                transactions = report.transactions,
                succeeded = report.succeeded,
                failed = report.failed,
                "prioritisation cycle complete"
            );
            if !pause(self.interval, &mut shutdown).await {
                info!(cycles = self.cycle, "prioritisation broadcaster stopped");
                return;
            }
        }
    }
}
