//! Server Configuration
//!
//! Loaded from environment variables, after an optional `.env` file.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use sentinel_core::{LayoutParseError, PublicInputLayout};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid PUBLIC_INPUT_LAYOUT: {0}")]
    Layout(#[from] LayoutParseError),

    #[error("invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable development mode (mock proofs, no node/snarkjs)
    #[serde(default)]
    pub dev_mode: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum concurrent proof generations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_proofs: usize,

    /// Directory holding the compiled credit-score circuit
    #[serde(default = "default_circuit_dir")]
    pub circuit_dir: PathBuf,

    /// snarkjs `verification_key.json` used for pre-flight verification
    pub verification_key_path: Option<PathBuf>,

    /// Scratch directory for per-request witness and proof files
    #[serde(default = "std::env::temp_dir")]
    pub temp_dir: PathBuf,

    /// Threshold used when a request does not carry one
    #[serde(default = "default_threshold")]
    pub default_threshold: u64,

    #[serde(default = "default_node_bin")]
    pub node_bin: String,

    #[serde(default = "default_snarkjs_bin")]
    pub snarkjs_bin: String,

    /// Public-input positions and statement policy of the circuit
    #[serde(default)]
    pub public_input_layout: PublicInputLayout,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_concurrent() -> usize {
    4
}

fn default_circuit_dir() -> PathBuf {
    PathBuf::from("circuits/build")
}

fn default_threshold() -> u64 {
    700
}

fn default_node_bin() -> String {
    "node".to_string()
}

fn default_snarkjs_bin() -> String {
    "snarkjs".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
            log_level: default_log_level(),
            json_logs: false,
            cors_origins: default_cors_origins(),
            max_concurrent_proofs: default_max_concurrent(),
            circuit_dir: default_circuit_dir(),
            verification_key_path: None,
            temp_dir: std::env::temp_dir(),
            default_threshold: default_threshold(),
            node_bin: default_node_bin(),
            snarkjs_bin: default_snarkjs_bin(),
            public_input_layout: PublicInputLayout::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).map(|v| v == "true").unwrap_or(false);

        let mut public_input_layout = match lookup("PUBLIC_INPUT_LAYOUT") {
            Some(raw) => raw.parse()?,
            None => PublicInputLayout::default(),
        };
        if let Some(min) = parse_var(&lookup, "MIN_THRESHOLD")? {
            public_input_layout.min_threshold = Some(min);
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(default_host),
            port: parse_var(&lookup, "PORT")?.unwrap_or_else(default_port),
            dev_mode: flag("DEV_MODE"),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(default_log_level),
            json_logs: flag("JSON_LOGS"),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or_else(default_cors_origins),
            max_concurrent_proofs: parse_var(&lookup, "MAX_CONCURRENT_PROOFS")?
                .unwrap_or_else(default_max_concurrent),
            circuit_dir: lookup("CIRCUIT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_circuit_dir),
            verification_key_path: lookup("VERIFICATION_KEY_PATH").map(PathBuf::from),
            temp_dir: lookup("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            default_threshold: parse_var(&lookup, "DEFAULT_THRESHOLD")?
                .unwrap_or_else(default_threshold),
            node_bin: lookup("NODE_BIN").unwrap_or_else(default_node_bin),
            snarkjs_bin: lookup("SNARKJS_BIN").unwrap_or_else(default_snarkjs_bin),
            public_input_layout,
        })
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_threshold, 700);
        assert!(!config.dev_mode);
        assert!(config.verification_key_path.is_none());
        assert_eq!(config.public_input_layout, PublicInputLayout::default());
    }

    #[test]
    fn test_layout_and_min_threshold() {
        let config = Config::from_lookup(lookup(&[
            ("PUBLIC_INPUT_LAYOUT", "predicate=2,threshold=none,identity=0"),
            ("MIN_THRESHOLD", "650"),
            ("DEV_MODE", "true"),
        ]))
        .unwrap();

        let layout = config.public_input_layout;
        assert_eq!(layout.predicate_index, 2);
        assert_eq!(layout.threshold_index, None);
        assert_eq!(layout.identity_index, 0);
        assert_eq!(layout.min_threshold, Some(650));
        assert!(config.dev_mode);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[("PUBLIC_INPUT_LAYOUT", "identity")])).unwrap_err();
        assert!(matches!(err, ConfigError::Layout(_)));
    }

    #[test]
    fn test_socket_addr() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8080);

        let config = Config {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
