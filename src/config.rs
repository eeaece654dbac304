use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::query::QueryOperator;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub inject: InjectConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/recall.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemoryConfig {
    /// Directory of front-mattered markdown documents to index.
    #[serde(default = "default_memory_dir")]
    pub dir: PathBuf,
    /// Character ceiling for derived summaries.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: default_memory_dir(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

fn default_memory_dir() -> PathBuf {
    PathBuf::from("./memory")
}
fn default_summary_max_chars() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct InjectConfig {
    /// When false the inject path short-circuits with no output.
    #[serde(default = "default_auto_inject")]
    pub auto_inject: bool,
    /// Result cap passed to the index store.
    #[serde(default = "default_max_results")]
    pub max_results: i64,
    /// Total character budget for summaries in one payload.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            auto_inject: default_auto_inject(),
            max_results: default_max_results(),
            max_chars: default_max_chars(),
        }
    }
}

fn default_auto_inject() -> bool {
    true
}
fn default_max_results() -> i64 {
    3
}
fn default_max_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenizerConfig {
    /// Use dictionary segmentation when the `jieba` feature is compiled in.
    /// Falls back to the n-gram strategy when the capability is absent.
    #[serde(default)]
    pub enhanced: bool,
    /// Query combination operator: "or" (broad recall) or "and" (precision).
    #[serde(default = "default_operator")]
    pub operator: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            enhanced: false,
            operator: default_operator(),
        }
    }
}

fn default_operator() -> String {
    "or".to_string()
}

impl TokenizerConfig {
    /// Parsed combination operator; unparsable values degrade to OR so the
    /// retrieval path never fails on configuration.
    pub fn query_operator(&self) -> QueryOperator {
        self.operator.parse().unwrap_or(QueryOperator::Or)
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.inject.max_results < 1 {
        anyhow::bail!("inject.max_results must be >= 1");
    }

    if config.memory.summary_max_chars == 0 {
        anyhow::bail!("memory.summary_max_chars must be > 0");
    }

    config
        .tokenizer
        .operator
        .parse::<QueryOperator>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Unknown tokenizer.operator: '{}'. Must be or, and.",
                config.tokenizer.operator
            )
        })?;

    Ok(config)
}

/// Load a configuration file, falling back to defaults when it is missing
/// or unreadable. The retrieval path uses this so a broken config file is
/// indistinguishable from no config file.
pub fn load_or_default(path: &Path) -> Config {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!("using default config: {e}");
            Config::default()
        }
    }
}
