use std::time::Duration;

use alloy::{primitives::Address, providers::MULTICALL3_ADDRESS};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::{
    fluid::CommonAddresses,
    multicall::{DEFAULT_BATCH_SIZE, DEFAULT_CALL_TIMEOUT},
    state::DEFAULT_MAX_VERSIONS,
};

/// JSON-RPC endpoint and multicall batching.
#[derive(Debug, Deserialize, Clone)]
pub struct RpcSettings {
    pub url: String,
    #[serde(default = "default_multicall_address")]
    pub multicall_address: Address,
    /// Maximum calls per multicall request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl RpcSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

fn default_multicall_address() -> Address {
    MULTICALL3_ADDRESS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT.as_secs()
}

/// Fluid deployment addresses.
#[derive(Debug, Deserialize, Clone)]
pub struct FluidSettings {
    #[serde(flatten)]
    pub addresses: CommonAddresses,
    /// Pools tracked from startup, before the factory reports any
    #[serde(default)]
    pub pools: Vec<Address>,
}

impl FluidSettings {
    pub fn common_addresses(&self) -> CommonAddresses {
        self.addresses
    }
}

/// Log polling and state history.
#[derive(Debug, Deserialize, Clone)]
pub struct SyncSettings {
    /// First block to sync from; the chain head when unset
    #[serde(default)]
    pub start_block: Option<u64>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_milliseconds: u64,
    #[serde(default = "default_max_state_versions")]
    pub max_state_versions: u64,
    /// Keep every pool's reserves in one state instead of one poller per pool
    #[serde(default)]
    pub aggregate_pools: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            start_block: None,
            poll_interval_milliseconds: default_poll_interval(),
            max_state_versions: default_max_state_versions(),
            aggregate_pools: false,
        }
    }
}

fn default_poll_interval() -> u64 {
    2_000
}

fn default_max_state_versions() -> u64 {
    DEFAULT_MAX_VERSIONS
}

/// Root application configuration.
///
/// Loaded from `config.yaml` (or any format the `config` crate detects) at
/// startup, with `FLUID__SECTION__KEY` environment variables on top.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc: RpcSettings,
    pub fluid: FluidSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("config"))
                .add_source(Environment::with_prefix("FLUID").separator("__"))
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}
