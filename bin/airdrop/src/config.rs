use config::{RouterEntry, RouterTable};
use lifecycle::LifecycleConfig;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Top-level airdrop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint url
    pub rpc_url: String,

    /// Router overrides, on top of the built-in table
    #[serde(default)]
    pub routers: Vec<RouterEntry>,

    /// Seconds to wait on the wallet before assuming the prompt was dismissed
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,

    /// Seconds a success stays visible before returning to idle
    #[serde(default = "default_success_display_secs")]
    pub success_display_secs: u64,

    /// Seconds a failure stays visible; unset keeps it until reset
    #[serde(default)]
    pub failure_display_secs: Option<u64>,

    /// Confirmations awaited for every transaction
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// Port for the Prometheus exporter; unset disables metrics
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Where the last form is cached
    #[serde(default)]
    pub cache_path: Option<String>,
}

const fn default_watchdog_secs() -> u64 {
    30
}

const fn default_success_display_secs() -> u64 {
    2
}

const fn default_confirmations() -> u64 {
    1
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;

        if config.confirmations == 0 {
            eyre::bail!("confirmations must be at least 1");
        }

        Ok(config)
    }

    /// Built-in routers overlaid with the configured ones.
    pub fn router_table(&self) -> eyre::Result<RouterTable> {
        Ok(RouterTable::with_entries(&self.routers)?)
    }

    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            watchdog: Duration::from_secs(self.watchdog_secs),
            success_display: Duration::from_secs(self.success_display_secs),
            failure_display: self.failure_display_secs.map(Duration::from_secs),
        }
    }

    /// Cache file location, defaulting to `.airdrop-cache.toml`.
    pub fn cache_path(&self) -> &str {
        self.cache_path.as_deref().unwrap_or(".airdrop-cache.toml")
    }
}
