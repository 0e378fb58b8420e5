//! Process configuration
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file) into plain structs that are handed to constructors. Nothing here is
//! global.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_DATA_PATH: &str = "./catalog_graph_data/graph.bin";
pub const DEFAULT_EMBED_MODEL: &str = "jina/jina-embeddings-v2-base-en";
pub const DEFAULT_DIMENSIONS: usize = 768;
pub const DEFAULT_TYPE_POOL: usize = 20;
pub const DEFAULT_MAX_K: usize = 30;
/// Name of the vector index over entity embeddings
pub const DEFAULT_INDEX_NAME: &str = "dataset-embeddings";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Embedding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbedBackend {
    /// Offline feature hashing, no model
    #[default]
    Hashing,
    Ollama,
    OpenAI,
}

impl FromStr for EmbedBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(EmbedBackend::Hashing),
            "ollama" => Ok(EmbedBackend::Ollama),
            "openai" => Ok(EmbedBackend::OpenAI),
            other => Err(format!("unknown provider `{}` (expected hashing, ollama or openai)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file; `None` keeps the store in memory only
    pub data_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: Some(PathBuf::from(DEFAULT_DATA_PATH)),
        }
    }
}

/// Upstream catalog endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub host: Option<String>,
    pub token: Option<String>,
    pub workspace: Option<String>,
}

impl CatalogConfig {
    /// Host, token and workspace, all of which must be set
    pub fn require(&self) -> ConfigResult<(&str, &str, &str)> {
        let host = self.host.as_deref().ok_or(ConfigError::Missing("GD_HOST"))?;
        let token = self.token.as_deref().ok_or(ConfigError::Missing("GD_TOKEN"))?;
        let workspace = self
            .workspace
            .as_deref()
            .ok_or(ConfigError::Missing("GD_WORKSPACE"))?;
        Ok((host, token, workspace))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedConfig {
    pub provider: EmbedBackend,
    /// Model name (e.g. "jina/jina-embeddings-v2-base-en", "text-embedding-3-small")
    pub model: String,
    /// API base URL; each HTTP backend has its own default
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub dimensions: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            provider: EmbedBackend::default(),
            model: DEFAULT_EMBED_MODEL.to_string(),
            api_base_url: None,
            api_key: None,
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub index_name: String,
    /// Candidates fetched before filtering by kind
    pub type_pool: usize,
    /// Largest accepted `k`
    pub max_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            type_pool: DEFAULT_TYPE_POOL,
            max_k: DEFAULT_MAX_K,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
    pub embed: EmbedConfig,
    pub search: SearchConfig,
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(path) = get("CATALOG_GRAPH_DATA") {
            config.store.data_path = Some(PathBuf::from(path));
        }

        config.catalog = CatalogConfig {
            host: get("GD_HOST").map(|h| h.trim_end_matches('/').to_string()),
            token: get("GD_TOKEN"),
            workspace: get("GD_WORKSPACE"),
        };

        if let Some(value) = get("EMBED_PROVIDER") {
            config.embed.provider = value.parse().map_err(|reason| ConfigError::Invalid {
                var: "EMBED_PROVIDER",
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(model) = get("EMBED_MODEL") {
            config.embed.model = model;
        }
        config.embed.api_base_url = get("EMBED_API_BASE");
        config.embed.api_key = get("EMBED_API_KEY");
        if let Some(value) = get("EMBED_DIMENSIONS") {
            config.embed.dimensions = parse_positive("EMBED_DIMENSIONS", &value)?;
        }

        if let Some(value) = get("SEARCH_TYPE_POOL") {
            config.search.type_pool = parse_positive("SEARCH_TYPE_POOL", &value)?;
        }
        if let Some(value) = get("SEARCH_MAX_K") {
            config.search.max_k = parse_positive("SEARCH_MAX_K", &value)?;
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, value: &str) -> ConfigResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
