//! Core configuration structures for the swapflow pipeline

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Chain configurations keyed by a short name ("mainnet", "base", ...)
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

impl AppConfig {
    /// Chain entry for an EVM chain id
    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.values().find(|chain| chain.chain_id == chain_id)
    }
}

/// Environment types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (e.g. "info,swapflow_executor=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// How the execution coordinator runs transaction steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Wait for inclusion of allowance and wrap transactions
    #[default]
    Sequential,

    /// Broadcast back-to-back and rely on nonce ordering
    Pipelined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub mode: ExecutorMode,

    /// Permit and order deadlines closer than this are treated as expired
    #[serde(default = "default_deadline_buffer_secs")]
    pub deadline_buffer_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prefix for exported metric names
    #[serde(default = "default_metrics_namespace")]
    pub namespace: String,
}

/// Per-chain execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EVM chain id
    pub chain_id: u64,

    /// How long to wait for inclusion in sequential mode. A timed-out step fails as a
    /// submission failure and keeps its nonce.
    #[serde(default = "default_inclusion_timeout_secs")]
    pub inclusion_timeout_secs: u64,
}

impl ChainConfig {
    pub fn inclusion_timeout(&self) -> Duration {
        Duration::from_secs(self.inclusion_timeout_secs)
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_deadline_buffer_secs() -> u64 {
    0
}

fn default_metrics_namespace() -> String {
    "swapflow".to_string()
}

fn default_inclusion_timeout_secs() -> u64 {
    180 // 3 minutes
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutorMode::default(),
            deadline_buffer_secs: default_deadline_buffer_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            namespace: default_metrics_namespace(),
        }
    }
}
