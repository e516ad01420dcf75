use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::fee::DEFAULT_COMMISSION_RATE;
use crate::ledger::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::notify::outbox::DEFAULT_QUEUE_SIZE;
use crate::transfer::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Per-target level overrides, e.g. `remit_engine::transfer: trace`
    #[serde(default)]
    pub log_targets: BTreeMap<String, String>,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL. Absent means the in-memory store.
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TransferConfig {
    /// Commission rate applied to every transfer (e.g. 0.015)
    pub commission_rate: Decimal,
    /// Attempts per transfer before giving up on lock conflicts
    pub max_attempts: u32,
    pub lock_timeout_ms: u64,
    /// Linear backoff step between attempts
    pub retry_backoff_ms: u64,
    /// Smallest amount accepted over HTTP
    pub min_amount: Decimal,
}

impl TransferConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lock_timeout_ms: 5_000,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF.as_millis() as u64,
            min_amount: Decimal::ONE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotifierConfig {
    pub queue_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LedgerConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`
    pub fn load(env: &str) -> anyhow::Result<Self> {
        Self::load_from(format!("config/{}.yaml", env))
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        crate::money::validate_rate(config.transfer.commission_rate)
            .context("transfer.commission_rate")?;
        anyhow::ensure!(
            config.transfer.min_amount > Decimal::ZERO,
            "transfer.min_amount must be positive"
        );
        Ok(config)
    }
}
