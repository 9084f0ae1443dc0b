//! Bumpfee monitor - fee escalation for stuck unconfirmed transactions
//!
//! # Architecture
//!
//! ```text
//! Monitor (orchestrator, owns all state)
//!   │
//!   ├── wallets         enumerated once at start
//!   ├── HeightCursor    last committed block height
//!   ├── TxStore         txid → TrackedTransaction
//!   │
//!   └── EscalationEngine (per wallet, per cycle)
//!         ├── Scanner          listunspent 0/0 above dust
//!         ├── estimate_fee_rate  first sighting only
//!         └── BumpPolicy       min(rate + bump, cap), ≥ 1 sat/vB increase
//! ```
//!
//! Entries leave the store only when escalated (or in dry run, when the
//! escalation is simulated). Transactions that confirm before reaching the
//! bump interval stay tracked unless `prune_confirmed` is on.

mod cursor;
mod engine;
mod estimator;
mod orchestrator;
mod policy;
mod scanner;
mod store;

pub use cursor::{HeightChange, HeightCursor};
pub use engine::{EscalationEngine, WalletReport};
pub use estimator::{estimate_fee_rate, tx_size};
pub use orchestrator::{CycleReport, Monitor};
pub use policy::{BumpPolicy, Escalation, MINIMUM_INCREMENT};
pub use scanner::{enumerate_wallets, Scanner};
pub use store::{TrackedTransaction, TxStore};
