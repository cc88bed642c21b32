use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{RagError, RagResult};
use crate::search::credential::Credential;

pub const SEARCH_API_KEY_VAR: &str = "RAG_SEARCH_API_KEY";
pub const SEARCH_BEARER_TOKEN_VAR: &str = "RAG_SEARCH_BEARER_TOKEN";
pub const EMBEDDINGS_API_KEY_VAR: &str = "RAG_EMBEDDINGS_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub embeddings: EmbeddingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URI of the search service, e.g. `https://<name>.search.windows.net`.
    pub endpoint: String,
    pub index_name: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Fallback when `RAG_SEARCH_API_KEY` is unset.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// OpenAI-compatible base URL; `/embeddings` is appended.
    pub api_base: String,
    pub model: String,
    /// Expected vector length. May be left out and supplied at index creation instead.
    #[serde(default)]
    pub dimensions: Option<usize>,
    /// Fallback when `RAG_EMBEDDINGS_API_KEY` is unset.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_api_version() -> String {
    "2024-07-01".to_string()
}

fn default_top_k() -> usize {
    3
}

impl SearchConfig {
    /// Env vars win over the file: api key first, then bearer token.
    pub fn credential(&self) -> RagResult<Credential> {
        if let Ok(key) = std::env::var(SEARCH_API_KEY_VAR) {
            return Ok(Credential::ApiKey(key));
        }
        if let Ok(token) = std::env::var(SEARCH_BEARER_TOKEN_VAR) {
            return Ok(Credential::BearerToken(token));
        }
        self.api_key.clone().map(Credential::ApiKey).ok_or_else(|| {
            RagError::Config(format!(
                "no search credential: set {SEARCH_API_KEY_VAR} or {SEARCH_BEARER_TOKEN_VAR}, or search.api_key in config.toml"
            ))
        })
    }
}

impl EmbeddingsConfig {
    pub fn api_key(&self) -> String {
        std::env::var(EMBEDDINGS_API_KEY_VAR)
            .unwrap_or_else(|_| self.api_key.clone().unwrap_or_default())
    }
}

fn resolve_config_path() -> RagResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(RagError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> RagResult<AppConfig> {
    let path = resolve_config_path()?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> RagResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    if config.search.top_k == 0 {
        return Err(RagError::Config("search.top_k must be at least 1".into()));
    }
    tracing::info!(
        path = %path.display(),
        index = %config.search.index_name,
        model = %config.embeddings.model,
        "config loaded"
    );
    Ok(config)
}
