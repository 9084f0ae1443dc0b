//! Fee escalation engine - one wallet, one cycle.
//!
//! ```text
//! scan ──► track new txids (gettransaction + estimate)
//!      ──► age report (height changed since last cycle)
//!      ──► evaluate each surfaced txid:
//!            NotDue          keep
//!            BelowIncrement  keep, log skip
//!            Bump            apply: bumpfee, drop on success / keep on error
//!                            dry run: log, drop
//! ```
//!
//! Every RPC failure is logged and retried next cycle by virtue of the
//! transaction still being unconfirmed (or still tracked).

use super::cursor::HeightChange;
use super::estimator::estimate_fee_rate;
use super::policy::{BumpPolicy, Escalation, MINIMUM_INCREMENT};
use super::scanner::Scanner;
use super::store::{TrackedTransaction, TxStore};
use crate::error::RpcError;
use crate::rpc::{Ledger, LedgerRpc};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Outcome counters for one wallet in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletReport {
    /// Scan call succeeded.
    pub scanned: bool,
    /// Distinct unconfirmed txids surfaced by the scan.
    pub unconfirmed: usize,
    pub newly_tracked: usize,
    pub age_reports: usize,
    pub not_due: usize,
    pub below_increment: usize,
    pub bumped: usize,
    pub simulated: usize,
    pub failures: usize,
    pub pruned: usize,
}

impl std::ops::AddAssign<&WalletReport> for WalletReport {
    fn add_assign(&mut self, o: &WalletReport) {
        self.scanned |= o.scanned;
        self.unconfirmed += o.unconfirmed;
        self.newly_tracked += o.newly_tracked;
        self.age_reports += o.age_reports;
        self.not_due += o.not_due;
        self.below_increment += o.below_increment;
        self.bumped += o.bumped;
        self.simulated += o.simulated;
        self.failures += o.failures;
        self.pruned += o.pruned;
    }
}

#[derive(Debug, Clone)]
pub struct EscalationEngine {
    policy: BumpPolicy,
    scanner: Scanner,
    prune_confirmed: bool,
}

impl EscalationEngine {
    pub fn new(policy: BumpPolicy, scanner: Scanner) -> Self {
        Self { policy, scanner, prune_confirmed: false }
    }

    pub fn with_prune_confirmed(mut self, prune: bool) -> Self {
        self.prune_confirmed = prune;
        self
    }

    pub fn policy(&self) -> &BumpPolicy {
        &self.policy
    }

    /// `evaluated` holds txids already escalated (or attempted) earlier in
    /// this cycle; a txid surfacing in several wallets is evaluated once.
    pub async fn process_wallet<R: LedgerRpc>(
        &self,
        ledger: &Ledger<R>,
        store: &mut TxStore,
        evaluated: &mut HashSet<String>,
        wallet: &str,
        height: u64,
        change: HeightChange,
    ) -> WalletReport {
        let mut report = WalletReport::default();

        let unspent = match self.scanner.scan(ledger, wallet).await {
            Ok(list) => list,
            Err(e) => {
                error!(wallet, error = %e, kind = e.kind(), "listing unconfirmed outputs failed");
                report.failures += 1;
                return report;
            }
        };
        report.scanned = true;
        let txids = unspent.txids();
        report.unconfirmed = txids.len();

        for txid in &txids {
            if store.contains(txid) {
                continue;
            }
            match self.track(ledger, store, wallet, txid, height).await {
                Ok(()) => report.newly_tracked += 1,
                Err(e) => {
                    error!(wallet, txid, error = %e, kind = e.kind(), "getting transaction failed");
                    report.failures += 1;
                }
            }
        }

        if change.reports_ages() && !txids.is_empty() {
            for tx in store.for_wallet(wallet) {
                info!(wallet, txid = %tx.txid, age = tx.age(height), "unconfirmed for {} blocks", tx.age(height));
                report.age_reports += 1;
            }
        }

        for txid in &txids {
            let Some(tx) = store.get(txid).cloned() else { continue };
            if !evaluated.insert(tx.txid.clone()) {
                debug!(wallet, txid, owner = %tx.wallet, "already evaluated this cycle");
                continue;
            }
            self.escalate(ledger, store, &tx, height, &mut report).await;
        }

        if self.prune_confirmed {
            for tx in store.prune_wallet(wallet, &txids) {
                info!(wallet, txid = %tx.txid, "no longer unconfirmed, dropped from tracking");
                report.pruned += 1;
            }
        }

        report
    }

    async fn track<R: LedgerRpc>(
        &self,
        ledger: &Ledger<R>,
        store: &mut TxStore,
        wallet: &str,
        txid: &str,
        height: u64,
    ) -> Result<(), RpcError> {
        let detail = ledger.get_transaction(wallet, txid).await?;
        let fee_rate = estimate_fee_rate(detail.fee, &detail.hex).ok_or_else(|| {
            RpcError::schema("gettransaction", serde::de::Error::custom(format!("unusable hex of length {}", detail.hex.len())))
        })?;
        store.track(TrackedTransaction::new(txid, wallet, height, fee_rate));
        info!(wallet, txid, fee_rate, height, "found new unconfirmed transaction");
        Ok(())
    }

    async fn escalate<R: LedgerRpc>(
        &self,
        ledger: &Ledger<R>,
        store: &mut TxStore,
        tx: &TrackedTransaction,
        height: u64,
        report: &mut WalletReport,
    ) {
        let (candidate, rounded) = match self.policy.evaluate(tx, height) {
            Escalation::NotDue { .. } => {
                report.not_due += 1;
                return;
            }
            Escalation::BelowIncrement { candidate } => {
                info!(
                    wallet = %tx.wallet, txid = %tx.txid, fee_rate = tx.fee_rate, candidate,
                    "not bumped, increase below {} sat/vB", MINIMUM_INCREMENT
                );
                report.below_increment += 1;
                return;
            }
            Escalation::Bump { candidate, rounded } => (candidate, rounded),
        };

        info!(wallet = %tx.wallet, txid = %tx.txid, fee_rate = tx.fee_rate, new_fee_rate = rounded, "bumping fee");

        if self.policy.dry_run() {
            store.remove(&tx.txid);
            info!(
                wallet = %tx.wallet, txid = %tx.txid, new_fee_rate = rounded, simulated_rate = candidate,
                "dry run, bumpfee not submitted"
            );
            report.simulated += 1;
            return;
        }

        match ledger.bump_fee(&tx.wallet, &tx.txid, rounded).await {
            Ok(result) => {
                store.remove(&tx.txid);
                info!(wallet = %tx.wallet, txid = %tx.txid, replacement = %result.txid, new_fee_rate = rounded, "fee bumped");
                report.bumped += 1;
            }
            Err(e) => {
                error!(wallet = %tx.wallet, txid = %tx.txid, error = %e, kind = e.kind(), "bumpfee failed");
                report.failures += 1;
            }
        }
    }
}
