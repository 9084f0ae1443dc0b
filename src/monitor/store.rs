//! Transaction state store - txid to tracked state, owned by the monitor.

use std::collections::HashMap;

/// An unconfirmed transaction the monitor has seen. Never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTransaction {
    pub txid: String,
    pub wallet: String,
    pub first_seen_height: u64,
    /// sat/vB at first sighting; not refreshed afterwards.
    pub fee_rate: f64,
}

impl TrackedTransaction {
    pub fn new(txid: impl Into<String>, wallet: impl Into<String>, first_seen_height: u64, fee_rate: f64) -> Self {
        Self { txid: txid.into(), wallet: wallet.into(), first_seen_height, fee_rate }
    }

    /// Blocks since first sighting. Negative after a reorg to a lower tip.
    pub fn age(&self, height: u64) -> i64 {
        height as i64 - self.first_seen_height as i64
    }
}

#[derive(Debug, Default)]
pub struct TxStore {
    entries: HashMap<String, TrackedTransaction>,
}

impl TxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, txid: &str) -> Option<&TrackedTransaction> {
        self.entries.get(txid)
    }

    pub fn contains(&self, txid: &str) -> bool {
        self.entries.contains_key(txid)
    }

    /// Insert unless already tracked; an existing entry is never replaced.
    /// Returns whether the entry was inserted.
    pub fn track(&mut self, tx: TrackedTransaction) -> bool {
        if self.entries.contains_key(&tx.txid) {
            return false;
        }
        self.entries.insert(tx.txid.clone(), tx);
        true
    }

    pub fn remove(&mut self, txid: &str) -> Option<TrackedTransaction> {
        self.entries.remove(txid)
    }

    /// Entries owned by `wallet`, sorted by txid for stable log output.
    pub fn for_wallet(&self, wallet: &str) -> Vec<&TrackedTransaction> {
        let mut txs: Vec<_> = self.entries.values().filter(|t| t.wallet == wallet).collect();
        txs.sort_by(|a, b| a.txid.cmp(&b.txid));
        txs
    }

    /// Drop `wallet`'s entries whose txid is not in `still_unconfirmed`.
    pub fn prune_wallet(&mut self, wallet: &str, still_unconfirmed: &[&str]) -> Vec<TrackedTransaction> {
        let stale: Vec<String> = self
            .entries
            .values()
            .filter(|t| t.wallet == wallet && !still_unconfirmed.contains(&t.txid.as_str()))
            .map(|t| t.txid.clone())
            .collect();
        stale.iter().filter_map(|txid| self.entries.remove(txid)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedTransaction> {
        self.entries.values()
    }
}
