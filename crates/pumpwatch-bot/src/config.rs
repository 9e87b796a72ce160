//! Application configuration.
//!
//! Loaded from a TOML file with the `config` crate and layered with
//! `PUMPWATCH__<SECTION>__<KEY>` environment overrides.

use crate::error::{AppError, AppResult};
use pumpwatch_classifier::ClassifierConfig;
use pumpwatch_core::{Address, Commitment, PUMP_FUN_PROGRAM_ID};
use pumpwatch_notify::NotifyConfig;
use pumpwatch_stream::{ConnectionConfig, EndpointConfig};
use pumpwatch_telemetry::DEFAULT_LOG_FILTER;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file used when neither `--config` nor `PUMPWATCH_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PUMPWATCH_CONFIG";

/// Prefix of environment overrides.
const ENV_PREFIX: &str = "PUMPWATCH";

/// Geyser stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// gRPC endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// Provider access token.
    #[serde(default)]
    pub x_token: Option<String>,
    #[serde(default)]
    pub commitment: Commitment,
    #[serde(default = "default_program_id")]
    pub program_id: String,
    /// Tag the server echoes back on matched transactions.
    #[serde(default = "default_filter_tag")]
    pub filter_tag: String,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_decoding_message_size")]
    pub max_decoding_message_size: usize,
    /// Maximum consecutive failed reconnects (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
}

fn default_program_id() -> String {
    PUMP_FUN_PROGRAM_ID.to_string()
}

fn default_filter_tag() -> String {
    "pumpFun".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_decoding_message_size() -> usize {
    1024 * 1024 * 1024
}

fn default_reconnect_base_delay_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            x_token: None,
            commitment: Commitment::default(),
            program_id: default_program_id(),
            filter_tag: default_filter_tag(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_decoding_message_size: default_max_decoding_message_size(),
            max_reconnect_attempts: 0,
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
        }
    }
}

/// Watch-list storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// JSON file holding `{address: label}`.
    #[serde(default = "default_registry_path")]
    pub path: String,
    /// How often the running bot re-reads the file (0 = never).
    #[serde(default = "default_reload_interval_ms")]
    pub reload_interval_ms: u64,
}

fn default_registry_path() -> String {
    "data/addresses.json".to_string()
}

fn default_reload_interval_ms() -> u64 {
    2_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            reload_interval_ms: default_reload_interval_ms(),
        }
    }
}

/// Classification settings. Program and tag come from `[stream]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSection {
    #[serde(default = "default_reserved_account_index")]
    pub reserved_account_index: u32,
    /// Account keys between the lamport account and the traded token
    /// account.
    #[serde(default = "default_sol_index_offset")]
    pub sol_index_offset: u32,
    #[serde(default = "default_classification_timeout_ms")]
    pub classification_timeout_ms: u64,
    /// Mirror classified buys through the executor.
    #[serde(default)]
    pub mirror_buys: bool,
}

fn default_reserved_account_index() -> u32 {
    1
}

fn default_sol_index_offset() -> u32 {
    1
}

fn default_classification_timeout_ms() -> u64 {
    30_000
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            reserved_account_index: default_reserved_account_index(),
            sol_index_offset: default_sol_index_offset(),
            classification_timeout_ms: default_classification_timeout_ms(),
            mirror_buys: false,
        }
    }
}

/// Mirror executor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// SOL spent per mirrored buy.
    #[serde(default = "default_buy_amount_sol")]
    pub buy_amount_sol: Decimal,
    /// Slippage tolerance in percent.
    #[serde(default = "default_slippage_pct")]
    pub slippage_pct: u32,
}

fn default_buy_amount_sol() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_slippage_pct() -> u32 {
    30
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            buy_amount_sol: default_buy_amount_sol(),
            slippage_pct: default_slippage_pct(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus metrics port (0 = disabled).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Config path: explicit argument > `PUMPWATCH_CONFIG` > default.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path` plus environment overrides.
    ///
    /// A missing file at the default path falls back to defaults; a missing
    /// explicitly named file is an error.
    pub fn load(path: &str) -> AppResult<Self> {
        let exists = Path::new(path).exists();
        if !exists && path != DEFAULT_CONFIG_PATH {
            return Err(AppError::Config(format!("Config file not found: {path}")));
        }

        let config: Self = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(exists))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if !exists {
            tracing::warn!(path, "Config file not found, using defaults");
        }
        Ok(config)
    }

    /// Parse a TOML document without environment overrides.
    pub fn from_toml(text: &str) -> AppResult<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Settings needed by the `run` command.
    pub fn validate(&self) -> AppResult<()> {
        if self.stream.endpoint.trim().is_empty() {
            return Err(AppError::Config("stream.endpoint must be set".to_string()));
        }
        self.program_id()?;
        if self.stream.filter_tag.trim().is_empty() {
            return Err(AppError::Config("stream.filter_tag must not be empty".to_string()));
        }
        if self.stream.reconnect_base_delay_ms > self.stream.reconnect_max_delay_ms {
            return Err(AppError::Config(
                "stream.reconnect_base_delay_ms exceeds reconnect_max_delay_ms".to_string(),
            ));
        }
        self.classifier_config()?
            .validate()
            .map_err(|e| AppError::Config(format!("classifier: {e}")))?;
        self.notify
            .validate()
            .map_err(|e| AppError::Config(format!("notify: {e}")))?;
        if self.classifier.mirror_buys && self.executor.buy_amount_sol <= Decimal::ZERO {
            return Err(AppError::Config(
                "executor.buy_amount_sol must be positive when mirror_buys is set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn program_id(&self) -> AppResult<Address> {
        Address::parse(&self.stream.program_id)
            .map_err(|e| AppError::Config(format!("stream.program_id: {e}")))
    }

    pub fn connection_config(&self) -> AppResult<ConnectionConfig> {
        Ok(ConnectionConfig {
            filter_tag: self.stream.filter_tag.clone(),
            program_id: self.program_id()?,
            commitment: self.stream.commitment,
            heartbeat_interval_ms: self.stream.heartbeat_interval_ms,
            max_reconnect_attempts: self.stream.max_reconnect_attempts,
            reconnect_base_delay_ms: self.stream.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.stream.reconnect_max_delay_ms,
        })
    }

    pub fn endpoint_config(&self) -> EndpointConfig {
        EndpointConfig {
            endpoint: self.stream.endpoint.clone(),
            x_token: self
                .stream
                .x_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            connect_timeout_ms: self.stream.connect_timeout_ms,
            request_timeout_ms: self.stream.request_timeout_ms,
            max_decoding_message_size: self.stream.max_decoding_message_size,
        }
    }

    pub fn classifier_config(&self) -> AppResult<ClassifierConfig> {
        Ok(ClassifierConfig {
            program_id: self.program_id()?,
            filter_tag: self.stream.filter_tag.clone(),
            reserved_account_index: self.classifier.reserved_account_index,
            sol_index_offset: self.classifier.sol_index_offset,
            classification_timeout_ms: self.classifier.classification_timeout_ms,
            mirror_buys: self.classifier.mirror_buys,
        })
    }
}
