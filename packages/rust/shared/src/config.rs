//! Application configuration for shopgraph.
//!
//! User config lives at `~/.shopgraph/shopgraph.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopGraphError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "shopgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".shopgraph";

// ---------------------------------------------------------------------------
// Config structs (matching shopgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// URI minting and entity defaults.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Graph store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Batch run settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// `[mapping]` section.
///
/// Passed as-is into the ingestion pipeline; nothing in the mapping path
/// reads global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Namespace every entity identifier is minted under.
    #[serde(default = "default_base_uri")]
    pub base_uri: String,

    /// Crawled origin prefix to replace (empty disables rewriting).
    #[serde(default)]
    pub source_domain: String,

    /// Published-site origin prefix that replaces `source_domain`.
    #[serde(default)]
    pub published_domain: String,

    /// ISO 4217 currency attached to every offer.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// schema.org availability attached to every offer.
    #[serde(default = "default_availability")]
    pub default_availability: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            source_domain: String::new(),
            published_domain: String::new(),
            default_currency: default_currency(),
            default_availability: default_availability(),
        }
    }
}

impl MappingConfig {
    /// Check the options the mapping layer cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.base_uri.trim().is_empty() {
            return Err(ShopGraphError::config("mapping.base_uri must not be empty"));
        }
        if !self.source_domain.is_empty() && self.published_domain.is_empty() {
            return Err(ShopGraphError::config(
                "mapping.published_domain is required when source_domain is set",
            ));
        }
        if self.default_currency.trim().is_empty() {
            return Err(ShopGraphError::config(
                "mapping.default_currency must not be empty",
            ));
        }
        Ok(())
    }
}

fn default_base_uri() -> String {
    "https://data.shopgraph.example/catalog".into()
}
fn default_currency() -> String {
    "GBP".into()
}
fn default_availability() -> String {
    "http://schema.org/InStock".into()
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the graph store API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8080".into()
}
fn default_api_key_env() -> String {
    "SHOPGRAPH_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum in-flight submissions (1 = strictly sequential).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Delete every entity in the store before ingesting.
    #[serde(default = "default_true")]
    pub cleanup: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            cleanup: true,
        }
    }
}

fn default_concurrency() -> usize {
    4
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.shopgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ShopGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.shopgraph/shopgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ShopGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ShopGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ShopGraphError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ShopGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ShopGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the store API key from the configured env var, if it is set and non-empty.
pub fn resolve_api_key(store: &StoreConfig) -> Option<String> {
    match std::env::var(&store.api_key_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => {
            tracing::debug!(var = %store.api_key_env, "no store API key in environment");
            None
        }
    }
}
