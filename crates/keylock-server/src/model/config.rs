//! Configuration management for keylock
//!
//! Sources, lowest precedence first: `conf/application.yml`, `KEYLOCK_*`
//! environment variables, command line flags.

use std::str::FromStr;

use clap::{Parser, Subcommand};
use config::{Config, ConfigBuilder, Environment, builder::DefaultState};
use keylock_common::{DEFAULT_EXPIRE_SECONDS, DISTRIBUTED_LOCK_PREFIX, KeylockError};
use keylock_core::ReleaseMode;

use crate::startup::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

const STORE_KIND: &str = "store.kind";
const STORE_REDIS_URL: &str = "store.redis_url";
const LOCK_PREFIX: &str = "lock.prefix";
const LOCK_RELEASE_MODE: &str = "lock.release_mode";
const LOCK_DEFAULT_EXPIRE: &str = "lock.default_expire";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "keylock", version, about = "Redis-backed distributed lock toolkit")]
pub struct Cli {
    /// Configuration file (missing file is ignored)
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config_file: String,
    /// Lock store: redis | memory
    #[arg(long = "store")]
    pub store: Option<String>,
    #[arg(long = "redis-url")]
    pub redis_url: Option<String>,
    /// Release mode: atomic | check-then-delete
    #[arg(long = "release-mode")]
    pub release_mode: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Call the lock-protected example service from several concurrent callers
    Demo {
        #[arg(long, default_value_t = 3)]
        callers: usize,
        /// Simulated work per call in milliseconds
        #[arg(long = "work-ms", default_value_t = 1000)]
        work_ms: u64,
    },
    /// Acquire a lock once and print its token
    Acquire {
        name: String,
        /// Expiry in seconds (defaults to lock.default_expire)
        #[arg(long)]
        expire: Option<u64>,
    },
    /// Release a lock previously acquired with `acquire`
    Release { name: String, token: String },
    /// Show the current holder token and remaining lifetime of a lock
    Status { name: String },
}

/// Which shared store backs the locks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Redis,
    Memory,
}

impl FromStr for StoreKind {
    type Err = KeylockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(KeylockError::ConfigError(format!(
                "unknown store kind '{}'",
                s
            ))),
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(cli: &Cli) -> Result<Self, KeylockError> {
        let mut builder = Self::base_builder(&cli.config_file);

        if let Some(v) = &cli.store {
            builder = builder
                .set_override(STORE_KIND, v.as_str())
                .map_err(config_error)?;
        }
        if let Some(v) = &cli.redis_url {
            builder = builder
                .set_override(STORE_REDIS_URL, v.as_str())
                .map_err(config_error)?;
        }
        if let Some(v) = &cli.release_mode {
            builder = builder
                .set_override(LOCK_RELEASE_MODE, v.as_str())
                .map_err(config_error)?;
        }

        let config = builder.build().map_err(config_error)?;
        Ok(Configuration { config })
    }

    fn base_builder(config_file: &str) -> ConfigBuilder<DefaultState> {
        Config::builder()
            .add_source(config::File::with_name(config_file).required(false))
            .add_source(
                Environment::with_prefix("KEYLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
    }

    // ========================================================================
    // Store Configuration
    // ========================================================================

    pub fn store_kind(&self) -> Result<StoreKind, KeylockError> {
        self.config
            .get_string(STORE_KIND)
            .unwrap_or("redis".to_string())
            .parse()
    }

    pub fn redis_url(&self) -> String {
        self.config
            .get_string(STORE_REDIS_URL)
            .unwrap_or(DEFAULT_REDIS_URL.to_string())
    }

    // ========================================================================
    // Lock Configuration
    // ========================================================================

    pub fn lock_prefix(&self) -> String {
        self.config
            .get_string(LOCK_PREFIX)
            .unwrap_or(DISTRIBUTED_LOCK_PREFIX.to_string())
    }

    pub fn release_mode(&self) -> Result<ReleaseMode, KeylockError> {
        match self.config.get_string(LOCK_RELEASE_MODE) {
            Ok(v) => v.parse(),
            Err(_) => Ok(ReleaseMode::default()),
        }
    }

    pub fn default_expire(&self) -> u64 {
        match self.config.get_int(LOCK_DEFAULT_EXPIRE) {
            Ok(v) if v > 0 => v as u64,
            _ => DEFAULT_EXPIRE_SECONDS,
        }
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string("logs.dir").ok(),
            self.config.get_bool("logs.console").unwrap_or(true),
            self.config.get_bool("logs.file").unwrap_or(false),
            self.config
                .get_string("logs.level")
                .unwrap_or("info".to_string()),
        )
        .with_rotation(
            &self
                .config
                .get_string("logs.rotation")
                .unwrap_or("daily".to_string()),
        )
    }
}

fn config_error(err: config::ConfigError) -> KeylockError {
    KeylockError::ConfigError(err.to_string())
}
