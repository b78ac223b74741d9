//! Shieldmint Configuration
//!
//! Handles loading configuration from:
//! 1. SHIELDMINT_CONFIG env var (explicit path)
//! 2. ./shieldmint.toml (current directory)
//! 3. ~/.shieldmint/shieldmint.toml (user home)
//!
//! Environment variables take precedence over TOML config. The loaded value
//! is handed to whoever needs it; there is no process-wide instance.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shieldmint_primitives::AztecAddress;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

const CONFIG_FILE_NAME: &str = "shieldmint.toml";
const CONFIG_DIR_NAME: &str = ".shieldmint";
const CONFIG_PATH_VAR: &str = "SHIELDMINT_CONFIG";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_PXE_URL: &str = "http://localhost:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_ADDRESSES_PATH: &str = "addresses.json";
const DEFAULT_TOKEN_KEY: &str = "token";
const DEFAULT_TOKEN_ARTIFACT: &str = "target/token_contract-Token.json";
const DEFAULT_PUBLIC_AMOUNT: u64 = 100;
const DEFAULT_PRIVATE_AMOUNT: u64 = 20;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShieldmintConfig {
    #[serde(default)]
    pub pxe: PxeConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub mint: MintConfig,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

/// PXE endpoint and polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PxeConfig {
    #[serde(default = "default_pxe_url")]
    pub url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Give up waiting for inclusion after this long; unset waits forever
    #[serde(default)]
    pub wait_timeout_secs: Option<u64>,
    /// Per-request HTTP timeout
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for PxeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PXE_URL.into(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wait_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

fn default_pxe_url() -> String {
    DEFAULT_PXE_URL.into()
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Where the token contract's address and artifact live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default = "default_addresses_path")]
    pub addresses_path: PathBuf,
    /// Key of the token entry in the address file
    #[serde(default = "default_token_key")]
    pub token_key: String,
    #[serde(default = "default_token_artifact")]
    pub token_artifact: PathBuf,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            addresses_path: DEFAULT_ADDRESSES_PATH.into(),
            token_key: DEFAULT_TOKEN_KEY.into(),
            token_artifact: DEFAULT_TOKEN_ARTIFACT.into(),
        }
    }
}

fn default_addresses_path() -> PathBuf {
    DEFAULT_ADDRESSES_PATH.into()
}
fn default_token_key() -> String {
    DEFAULT_TOKEN_KEY.into()
}
fn default_token_artifact() -> PathBuf {
    DEFAULT_TOKEN_ARTIFACT.into()
}

/// Mint amounts. TOML integers are 64-bit, token amounts are widened on use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintConfig {
    #[serde(default = "default_public_amount")]
    pub public_amount: u64,
    #[serde(default = "default_private_amount")]
    pub private_amount: u64,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            public_amount: DEFAULT_PUBLIC_AMOUNT,
            private_amount: DEFAULT_PRIVATE_AMOUNT,
        }
    }
}

fn default_public_amount() -> u64 {
    DEFAULT_PUBLIC_AMOUNT
}
fn default_private_amount() -> u64 {
    DEFAULT_PRIVATE_AMOUNT
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Minting account; falls back to the first registered account
    #[serde(default)]
    pub owner: Option<String>,
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Set field from env var if present
fn env_string(lookup: Lookup, key: &str, field: &mut String) {
    if let Some(v) = lookup(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(lookup: Lookup, key: &str, field: &mut Option<String>) {
    if let Some(v) = lookup(key) {
        *field = Some(v);
    }
}

fn env_path(lookup: Lookup, key: &str, field: &mut PathBuf) {
    if let Some(v) = lookup(key) {
        *field = PathBuf::from(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(lookup: Lookup, key: &str, field: &mut T) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

/// Set Option<T> from env var if present and parseable
fn env_parse_option<T: std::str::FromStr>(lookup: Lookup, key: &str, field: &mut Option<T>) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => log::warn!("Ignoring unparseable {}={}", key, v),
        }
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

// ============================================================================
// Implementation
// ============================================================================

impl ShieldmintConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        Self::load_with(process_env)
    }

    /// Same as [`load`](Self::load), reading variables through `lookup`
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match Self::find_config_file(&lookup) {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                Self::read(&path)?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_overrides(&lookup);
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_overrides(&process_env);
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file(lookup: Lookup) -> Option<PathBuf> {
        // 1. Check SHIELDMINT_CONFIG env var
        if let Some(path) = lookup(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            log::warn!("{} points at missing file {}", CONFIG_PATH_VAR, path.display());
        }

        // 2. Check ./shieldmint.toml
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.shieldmint/shieldmint.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_overrides(&mut self, lookup: Lookup) {
        // PXE
        env_string(lookup, "PXE_URL", &mut self.pxe.url);
        env_parse(
            lookup,
            "SHIELDMINT_POLL_INTERVAL_MS",
            &mut self.pxe.poll_interval_ms,
        );
        env_parse_option(
            lookup,
            "SHIELDMINT_WAIT_TIMEOUT_SECS",
            &mut self.pxe.wait_timeout_secs,
        );

        // Contracts
        env_path(lookup, "SHIELDMINT_ADDRESSES", &mut self.contracts.addresses_path);
        env_path(
            lookup,
            "SHIELDMINT_TOKEN_ARTIFACT",
            &mut self.contracts.token_artifact,
        );

        // Accounts
        env_option_string(lookup, "SHIELDMINT_OWNER", &mut self.accounts.owner);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.pxe.wait_timeout_secs = Some(600);
        sample.pxe.request_timeout_secs = Some(30);
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.pxe.poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.pxe.wait_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.pxe.request_timeout_secs.map(Duration::from_secs)
    }

    /// Configured owner, parsed
    pub fn owner(&self) -> Result<Option<AztecAddress>> {
        self.accounts
            .owner
            .as_deref()
            .map(|s| {
                s.parse::<AztecAddress>()
                    .with_context(|| format!("Invalid owner address in config: {s}"))
            })
            .transpose()
    }
}

// ============================================================================
// Tests
// ============================================================================
