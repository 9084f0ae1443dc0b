//! Configuration - JSON file, then environment, then CLI overrides
//!
//! ```json
//! {
//!   "rpc": {"url": "http://127.0.0.1:8332", "username": "u", "password": "p"},
//!   "bumpfee": {"apply": false, "bump_interval_blocks": 3, "fee_bump_amount": 2.0, "fee_cap": 50.0},
//!   "prioritise": {"fee_delta_sat": 10000, "nodes": [{"url": "...", "username": "...", "password": "..."}]}
//! }
//! ```
//!
//! | Env | Overrides |
//! |-----|-----------|
//! | `BITCOIN_RPC_URL` | `rpc.url` |
//! | `BITCOIN_RPC_USER` | `rpc.username` |
//! | `BITCOIN_RPC_PASS` | `rpc.password` |
//! | `FEEBUMP_APPLY` | `bumpfee.apply` |

use crate::error::ConfigError;
use bitcoin::Amount;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "feebump.json";

/// Outputs below this are change dust and never tracked.
pub const DEFAULT_MINIMUM_AMOUNT_SAT: u64 = 2_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Per-request HTTP timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { url: url.into(), username: username.into(), password: password.into(), timeout_secs: None }
    }
    pub fn with_timeout_secs(mut self, secs: u64) -> Self { self.timeout_secs = Some(secs); self }

    /// `fields` names url, username and password in error messages.
    fn validate(&self, fields: [&'static str; 3]) -> Result<(), ConfigError> {
        let [url, username, password] = fields;
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing(url));
        }
        if self.username.is_empty() {
            return Err(ConfigError::Missing(username));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing(password));
        }
        Ok(())
    }
}

/// Fee escalation policy plus the monitor's scheduling knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BumpConfig {
    /// Submit `bumpfee`. When false, decisions are only logged.
    pub apply: bool,
    pub poll_interval_secs: u64,
    /// Minimum age in blocks before a transaction is escalated.
    pub bump_interval_blocks: u64,
    /// sat/vB added to the first-seen fee rate.
    pub fee_bump_amount: f64,
    /// Highest fee rate (sat/vB) an escalation may reach.
    pub fee_cap: f64,
    pub minimum_amount_sat: u64,
    /// Drop entries whose transaction no longer shows up unconfirmed.
    pub prune_confirmed: bool,
    /// Stop on SIGINT/SIGTERM between cycles instead of dying mid-cycle.
    pub graceful_shutdown: bool,
}

impl Default for BumpConfig {
    fn default() -> Self {
        Self {
            apply: false,
            poll_interval_secs: 60,
            bump_interval_blocks: 3,
            fee_bump_amount: 2.0,
            fee_cap: 50.0,
            minimum_amount_sat: DEFAULT_MINIMUM_AMOUNT_SAT,
            prune_confirmed: false,
            graceful_shutdown: false,
        }
    }
}

impl BumpConfig {
    pub fn with_apply(mut self, apply: bool) -> Self { self.apply = apply; self }
    pub fn with_interval_blocks(mut self, blocks: u64) -> Self { self.bump_interval_blocks = blocks; self }
    pub fn with_bump(mut self, amount: f64, cap: f64) -> Self { self.fee_bump_amount = amount; self.fee_cap = cap; self }
    pub fn with_prune_confirmed(mut self, prune: bool) -> Self { self.prune_confirmed = prune; self }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn minimum_amount(&self) -> Amount {
        Amount::from_sat(self.minimum_amount_sat)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid { field: "bumpfee.poll_interval_secs", reason: "must be greater than zero".into() });
        }
        if !self.fee_bump_amount.is_finite() || self.fee_bump_amount < 0.0 {
            return Err(ConfigError::Invalid { field: "bumpfee.fee_bump_amount", reason: format!("{} is not a non-negative number", self.fee_bump_amount) });
        }
        if !self.fee_cap.is_finite() || self.fee_cap < 0.0 {
            return Err(ConfigError::Invalid { field: "bumpfee.fee_cap", reason: format!("{} is not a non-negative number", self.fee_cap) });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrioritiseConfig {
    pub check_interval_secs: u64,
    /// Virtual fee (satoshis) added on every mining node.
    pub fee_delta_sat: i64,
    pub minimum_amount_sat: u64,
    pub nodes: Vec<RpcConfig>,
    pub graceful_shutdown: bool,
}

impl Default for PrioritiseConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            fee_delta_sat: 10_000,
            minimum_amount_sat: DEFAULT_MINIMUM_AMOUNT_SAT,
            nodes: Vec::new(),
            graceful_shutdown: false,
        }
    }
}

impl PrioritiseConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn minimum_amount(&self) -> Amount {
        Amount::from_sat(self.minimum_amount_sat)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Invalid { field: "prioritise.check_interval_secs", reason: "must be greater than zero".into() });
        }
        if self.nodes.is_empty() {
            return Err(ConfigError::Missing("prioritise.nodes"));
        }
        for node in &self.nodes {
            node.validate(["prioritise.nodes[].url", "prioritise.nodes[].username", "prioritise.nodes[].password"])?;
        }
        Ok(())
    }
}

/// Whole-process settings. Higher layers construct or load this.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcConfig,
    pub log_file: Option<PathBuf>,
    pub bumpfee: BumpConfig,
    pub prioritise: PrioritiseConfig,
}

impl Config {
    pub fn new(rpc: RpcConfig) -> Self {
        Self { rpc, ..Default::default() }
    }
    pub fn with_bumpfee(mut self, c: BumpConfig) -> Self { self.bumpfee = c; self }
    pub fn with_prioritise(mut self, c: PrioritiseConfig) -> Self { self.prioritise = c; self }

    /// Parse `path`. A missing file at the default path is not an error so
    /// environment-only setups work.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && path == Path::new(DEFAULT_CONFIG_PATH) => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
        };
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Apply `BITCOIN_RPC_*` and `FEEBUMP_APPLY` when set and non-empty.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        let var = |key: &str| std::env::var(key).ok().filter(|s| !s.is_empty());
        if let Some(url) = var("BITCOIN_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(user) = var("BITCOIN_RPC_USER") {
            self.rpc.username = user;
        }
        if let Some(pass) = var("BITCOIN_RPC_PASS") {
            self.rpc.password = pass;
        }
        if let Some(apply) = var("FEEBUMP_APPLY") {
            self.bumpfee.apply = parse_flag(&apply).ok_or_else(|| ConfigError::Invalid {
                field: "FEEBUMP_APPLY",
                reason: format!("expected 1/0/true/false, got {:?}", apply),
            })?;
        }
        Ok(self)
    }

    /// Checks shared by every command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rpc.validate(["rpc.url", "rpc.username", "rpc.password"])?;
        self.bumpfee.validate()
    }

    /// File, then environment, then validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?.apply_env()?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load `KEY=value` lines from `.env` into variables that are not yet set.
pub fn load_dotenv(path: &Path) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn clear_env() {
        for key in ["BITCOIN_RPC_URL", "BITCOIN_RPC_USER", "BITCOIN_RPC_PASS", "FEEBUMP_APPLY"] {
            std::env::remove_var(key);
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("feebump.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let _guard = lock_env();
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"rpc": {"url": "http://node:8332", "username": "u", "password": "p"}}"#);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rpc.url, "http://node:8332");
        assert_eq!(config.rpc.timeout_secs, None);
        assert!(!config.bumpfee.apply);
        assert_eq!(config.bumpfee.minimum_amount(), Amount::from_sat(2_000));
        assert_eq!(config.bumpfee.poll_interval(), Duration::from_secs(60));
        assert!(!config.bumpfee.prune_confirmed);
    }

    #[test]
    fn env_overrides_file() {
        let _guard = lock_env();
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"rpc": {"url": "http://file:8332", "username": "u", "password": "p"}, "bumpfee": {"apply": false}}"#);

        std::env::set_var("BITCOIN_RPC_URL", "http://env:18443");
        std::env::set_var("FEEBUMP_APPLY", "true");
        let config = Config::load(&path);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.rpc.url, "http://env:18443");
        assert!(config.bumpfee.apply);
    }

    #[test]
    fn bad_apply_flag_is_config_error() {
        let _guard = lock_env();
        clear_env();
        std::env::set_var("FEEBUMP_APPLY", "maybe");
        let result = Config::default().apply_env();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid { field: "FEEBUMP_APPLY", .. })));
    }

    #[test]
    fn missing_credentials_rejected() {
        let config = Config::new(RpcConfig::new("http://node:8332", "", "p"));
        assert!(matches!(config.validate(), Err(ConfigError::Missing("rpc.username"))));
    }

    #[test]
    fn negative_policy_values_rejected() {
        let rpc = RpcConfig::new("http://node:8332", "u", "p");
        let config = Config::new(rpc.clone()).with_bumpfee(BumpConfig::default().with_bump(-1.0, 10.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "bumpfee.fee_bump_amount", .. })));

        let config = Config::new(rpc).with_bumpfee(BumpConfig::default().with_bump(1.0, f64::NAN));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "bumpfee.fee_cap", .. })));
    }

    #[test]
    fn unparseable_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{not json");
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn prioritise_requires_nodes() {
        let cfg = PrioritiseConfig::default();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("prioritise.nodes"))));

        let cfg = PrioritiseConfig { nodes: vec![RpcConfig::new("http://miner:8332", "m", "")], ..Default::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("prioritise.nodes[].password"))));
    }

    #[test]
    fn dotenv_does_not_clobber_existing_vars() {
        let _guard = lock_env();
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# comment\nBITCOIN_RPC_USER=\"fromfile\"\nBITCOIN_RPC_PASS=secret\n").unwrap();
        std::env::set_var("BITCOIN_RPC_PASS", "already");

        load_dotenv(&path);
        let user = std::env::var("BITCOIN_RPC_USER").ok();
        let pass = std::env::var("BITCOIN_RPC_PASS").ok();
        clear_env();

        assert_eq!(user.as_deref(), Some("fromfile"));
        assert_eq!(pass.as_deref(), Some("already"));
    }
}
