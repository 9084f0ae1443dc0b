//! Feebump: escalate fees of stuck unconfirmed wallet transactions.
//!
//! # Architecture
//!
//! ```text
//! feebump (binary)
//!   │
//!   ├── Config (JSON file → env → CLI)
//!   │
//!   ├── Ledger<HttpRpcClient> (JSON-RPC 1.0 over HTTP, basic auth)
//!   │     ├── node endpoint     listwallets, getblockcount, prioritisetransaction
//!   │     └── /wallet/<name>    listunspent, gettransaction, bumpfee
//!   │
//!   ├── Monitor (bump)
//!   │     └── EscalationEngine → TxStore, HeightCursor, BumpPolicy
//!   │
//!   └── Prioritiser (prioritise)
//!         └── MiningNode × N
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use feebump::{BumpConfig, HttpRpcClient, Ledger, Monitor, RpcConfig};
//!
//! let rpc = HttpRpcClient::new(&RpcConfig::new("http://127.0.0.1:8332", "user", "pass"))?;
//! let mut monitor = Monitor::start(Ledger::new(rpc), &BumpConfig::default()).await;
//! let report = monitor.run_cycle().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod prioritise;
pub mod rpc;
pub mod runtime;

pub use config::{BumpConfig, Config, PrioritiseConfig, RpcConfig};
pub use error::{ConfigError, RpcError};
pub use monitor::{
    BumpPolicy, CycleReport, Escalation, EscalationEngine, HeightChange, HeightCursor, Monitor,
    Scanner, TrackedTransaction, TxStore, WalletReport,
};
pub use prioritise::{MiningNode, PrioritiseReport, Prioritiser};
pub use rpc::{Endpoint, HttpRpcClient, Ledger, LedgerRpc};
pub use runtime::{install_signal_handlers, Shutdown};
