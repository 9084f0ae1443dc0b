//! Error kinds for the RPC boundary and start-up configuration.
//!
//! Everything under [`RpcError`] is recoverable: the monitor logs it and skips
//! the unit of work (one wallet or one transaction) until the next cycle.
//! [`ConfigError`] is the only fatal kind.

use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection refused, timeout, unreadable body, non-2xx without envelope.
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    /// Non-null `error` field in the JSON-RPC response.
    #[error("RPC error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// Response decoded but did not have the expected shape.
    #[error("unexpected {method} response: {source}")]
    Schema {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    pub fn transport(err: impl Into<BoxError>) -> Self {
        RpcError::Transport(err.into())
    }

    pub fn schema(method: &str, source: serde_json::Error) -> Self {
        RpcError::Schema { method: method.to_string(), source }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Transport(_) => "transport",
            RpcError::Protocol { .. } => "protocol",
            RpcError::Schema { .. } => "schema",
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        RpcError::Transport(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let transport = RpcError::transport("connection refused");
        assert_eq!(transport.kind(), "transport");
        assert!(transport.to_string().contains("connection refused"));

        let protocol = RpcError::Protocol { code: -5, message: "Invalid or non-wallet transaction id".into() };
        assert_eq!(protocol.kind(), "protocol");
        assert_eq!(protocol.to_string(), "RPC error -5: Invalid or non-wallet transaction id");

        let bad = serde_json::from_str::<u64>("\"x\"").unwrap_err();
        let schema = RpcError::schema("getblockcount", bad);
        assert_eq!(schema.kind(), "schema");
        assert!(schema.to_string().starts_with("unexpected getblockcount response"));
    }
}
