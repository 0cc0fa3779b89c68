//! TOML configuration with per-field defaults and environment overrides.
//!
//! Every section is optional. A missing config file yields the defaults,
//! after which `MODEL_PATH`, `DOCS_DIR`, `RAG_DB_PATH` and `LLM_ENDPOINT`
//! override the corresponding fields.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,
    pub documents: DocumentsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub model: ModelConfig,
    pub prompt: PromptConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DbConfig {
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/data/index/rag.db"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    /// Matched case-insensitively against paths relative to `root`.
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/data/documents"),
            include_globs: vec![
                "**/*.txt".to_string(),
                "**/*.md".to_string(),
                "**/*.log".to_string(),
            ],
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

/// Window sizes in characters.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_top_k: i64,
    pub max_top_k: i64,
    pub search_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 4,
            max_top_k: 50,
            search_timeout_secs: 30,
        }
    }
}

impl RetrievalConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// GGUF file the local inference server was started with.
    pub path: PathBuf,
    /// Base URL of the llama.cpp-compatible server.
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub translation_temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/data/models/model_1.gguf"),
            endpoint: "http://127.0.0.1:8080".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            translation_temperature: 0.1,
            timeout_secs: 300,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Name sent in the `model` field of completion requests.
    pub fn model_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "local".to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PromptConfig {
    pub system: String,
    /// Language questions are translated into before searching.
    pub search_language: String,
    /// Label for the language users ask in, used in the prompt.
    pub question_language: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: "You are a concise assistant. Use the provided RAG_SNIPPETS to answer the \
                     user's question. Answer in the same language as the user's question."
                .to_string(),
            search_language: "Spanish".to_string(),
            question_language: "Catalan".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Load configuration from `path` (if it exists), apply environment
/// overrides, and validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

impl Config {
    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MODEL_PATH") {
            self.model.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOCS_DIR") {
            self.documents.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("RAG_DB_PATH") {
            self.db.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LLM_ENDPOINT") {
            self.model.endpoint = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be > 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }

        if self.retrieval.default_top_k < 1 {
            bail!("retrieval.default_top_k must be >= 1");
        }
        if self.retrieval.default_top_k > self.retrieval.max_top_k {
            bail!("retrieval.default_top_k must not exceed retrieval.max_top_k");
        }
        if self.retrieval.search_timeout_secs == 0 {
            bail!("retrieval.search_timeout_secs must be > 0");
        }

        if self.model.timeout_secs == 0 {
            bail!("model.timeout_secs must be > 0");
        }
        if self.model.max_tokens == 0 {
            bail!("model.max_tokens must be > 0");
        }
        for (name, t) in [
            ("model.temperature", self.model.temperature),
            ("model.translation_temperature", self.model.translation_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                bail!("{} must be in [0.0, 2.0]", name);
            }
        }

        if self.documents.include_globs.is_empty() {
            bail!("documents.include_globs must not be empty");
        }

        Ok(())
    }
}
