//! Poll orchestrator - owns the state and drives one full cycle per tick.

use super::cursor::{HeightChange, HeightCursor};
use super::engine::{EscalationEngine, WalletReport};
use super::policy::BumpPolicy;
use super::scanner::{enumerate_wallets, Scanner};
use super::store::TxStore;
use crate::config::BumpConfig;
use crate::error::RpcError;
use crate::rpc::{Ledger, LedgerRpc};
use crate::runtime::pause;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Result of one complete pass over every wallet.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub height: u64,
    pub change: HeightChange,
    pub wallets: Vec<(String, WalletReport)>,
    /// Store size after the cycle.
    pub tracked: usize,
}

impl CycleReport {
    pub fn wallet(&self, name: &str) -> Option<&WalletReport> {
        self.wallets.iter().find(|(w, _)| w == name).map(|(_, r)| r)
    }

    pub fn totals(&self) -> WalletReport {
        let mut total = WalletReport::default();
        for (_, r) in &self.wallets {
            total += r;
        }
        total
    }
}

/// The fee-bump monitor. Wallets are fixed at construction.
pub struct Monitor<R> {
    ledger: Ledger<R>,
    engine: EscalationEngine,
    store: TxStore,
    cursor: HeightCursor,
    wallets: Vec<String>,
    poll_interval: Duration,
}

impl<R: LedgerRpc> Monitor<R> {
    /// Enumerate wallets once and build the monitor.
    pub async fn start(ledger: Ledger<R>, config: &BumpConfig) -> Self {
        let wallets = enumerate_wallets(&ledger).await;
        Self::with_wallets(ledger, config, wallets)
    }

    pub fn with_wallets(ledger: Ledger<R>, config: &BumpConfig, wallets: Vec<String>) -> Self {
        let engine = EscalationEngine::new(BumpPolicy::from(config), Scanner::new(config.minimum_amount()))
            .with_prune_confirmed(config.prune_confirmed);
        Self {
            ledger,
            engine,
            store: TxStore::new(),
            cursor: HeightCursor::new(),
            wallets,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn wallets(&self) -> &[String] {
        &self.wallets
    }

    pub fn store(&self) -> &TxStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TxStore {
        &mut self.store
    }

    pub fn cursor(&self) -> HeightCursor {
        self.cursor
    }

    pub fn ledger(&self) -> &Ledger<R> {
        &self.ledger
    }

    /// One cycle: height, every wallet in enumeration order, cursor update.
    /// Fails only when the block height cannot be read.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, RpcError> {
        let height = self.ledger.block_count().await?;
        let change = self.cursor.compare(height);
        if change.is_new_block() {
            info!(height, "new block detected");
        }

        let mut wallets = Vec::with_capacity(self.wallets.len());
        let mut evaluated = HashSet::new();
        for wallet in &self.wallets {
            let report = self
                .engine
                .process_wallet(&self.ledger, &mut self.store, &mut evaluated, wallet, height, change)
                .await;
            wallets.push((wallet.clone(), report));
        }
        self.cursor.commit(height);

        Ok(CycleReport { height, change, wallets, tracked: self.store.len() })
    }

    /// Poll until `shutdown` fires. Without a receiver this never returns.
    pub async fn run(mut self, mut shutdown: Option<broadcast::Receiver<()>>) {
        let policy = *self.engine.policy();
        info!(
            wallets = ?self.wallets,
            apply = policy.apply,
            interval_blocks = policy.interval_blocks,
            bump_amount = policy.bump_amount,
            fee_cap = policy.fee_cap,
            poll_secs = self.poll_interval.as_secs(),
            "bumpfee monitor started"
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => debug!(height = report.height, tracked = report.tracked, totals = ?report.totals(), "cycle complete"),
                Err(e) => error!(error = %e, kind = e.kind(), "getting block count failed, skipping cycle"),
            }
            if !pause(self.poll_interval, &mut shutdown).await {
                info!(tracked = self.store.len(), "bumpfee monitor stopped");
                return;
            }
        }
    }
}
