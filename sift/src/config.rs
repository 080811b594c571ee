//! Engine configuration: an explicit value, constructed once and passed by
//! reference into the engine and collaborator constructors.
//!
//! Sources layer as defaults < `sift.toml` < process environment, resolved at
//! construction time; nothing reads ambient environment after that. `validate`
//! gates every query so a missing mandatory key aborts before the first node
//! runs. Examples seed the environment from `.env` via the `dotenv` crate.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::WorkflowError;

/// Groq's OpenAI-compatible chat endpoint, the default chat backend.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Configuration for an adaptive retrieval engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// API key for the chat endpoint. Required.
    pub groq_api_key: Option<String>,
    /// API key for the web search collaborator. Required.
    pub tavily_api_key: Option<String>,
    /// API key for embeddings. Optional; absence is logged as a warning.
    pub openai_api_key: Option<String>,

    /// Chat model for grading and generation.
    pub chat_model: String,
    /// Chat model for question routing.
    pub router_model: String,
    /// Embedding model for the corpus index.
    pub embedding_model: String,
    /// OpenAI-compatible base URL for chat completions.
    pub chat_api_base: String,
    /// Sampling temperature for all chat calls.
    pub temperature: f32,

    /// Target chunk size (characters) for corpus ingestion.
    pub chunk_size: usize,
    /// Chunk overlap (characters) for oversized paragraphs.
    pub chunk_overlap: usize,
    /// Passages returned per corpus retrieval.
    pub retrieval_k: usize,
    /// Result snippets merged per web search.
    pub web_search_results: usize,
    /// Where the corpus index is persisted.
    pub index_path: PathBuf,

    /// Optional ceiling on node executions per query. `None` leaves the
    /// regenerate loop unbounded; setting it trades a possible
    /// `IterationLimit` error for guaranteed termination.
    pub max_iterations: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            tavily_api_key: None,
            openai_api_key: None,
            chat_model: "llama3-8b-8192".to_string(),
            router_model: "llama3-70b-8192".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            chat_api_base: GROQ_API_BASE.to_string(),
            temperature: 0.0,
            chunk_size: 500,
            chunk_overlap: 0,
            retrieval_k: 4,
            web_search_results: 3,
            index_path: PathBuf::from("./data/vectorstore.json"),
            max_iterations: None,
        }
    }
}

/// `sift.toml` shape; every field optional, overlaying the defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    keys: FileKeys,
    #[serde(default)]
    models: FileModels,
    #[serde(default)]
    retrieval: FileRetrieval,
    #[serde(default)]
    limits: FileLimits,
}

#[derive(Debug, Default, Deserialize)]
struct FileKeys {
    groq_api_key: Option<String>,
    tavily_api_key: Option<String>,
    openai_api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileModels {
    chat: Option<String>,
    router: Option<String>,
    embedding: Option<String>,
    chat_api_base: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileRetrieval {
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    k: Option<usize>,
    web_search_results: Option<usize>,
    index_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLimits {
    max_iterations: Option<usize>,
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl EngineConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// Defaults overlaid with a `sift.toml` file.
    pub fn from_file(path: &Path) -> Result<Self, WorkflowError> {
        let text = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&text)
            .map_err(|e| WorkflowError::Configuration(format!("parse {}: {e}", path.display())))?;
        Ok(Self::default().overlay_file(file))
    }

    /// File layer then environment layer; the environment wins.
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        Ok(Self::from_file(path)?.overlay_env())
    }

    fn overlay_file(mut self, file: FileConfig) -> Self {
        let FileConfig {
            keys,
            models,
            retrieval,
            limits,
        } = file;
        self.groq_api_key = keys.groq_api_key.or(self.groq_api_key);
        self.tavily_api_key = keys.tavily_api_key.or(self.tavily_api_key);
        self.openai_api_key = keys.openai_api_key.or(self.openai_api_key);
        self.chat_model = models.chat.unwrap_or(self.chat_model);
        self.router_model = models.router.unwrap_or(self.router_model);
        self.embedding_model = models.embedding.unwrap_or(self.embedding_model);
        self.chat_api_base = models.chat_api_base.unwrap_or(self.chat_api_base);
        self.temperature = models.temperature.unwrap_or(self.temperature);
        self.chunk_size = retrieval.chunk_size.unwrap_or(self.chunk_size);
        self.chunk_overlap = retrieval.chunk_overlap.unwrap_or(self.chunk_overlap);
        self.retrieval_k = retrieval.k.unwrap_or(self.retrieval_k);
        self.web_search_results = retrieval.web_search_results.unwrap_or(self.web_search_results);
        self.index_path = retrieval.index_path.unwrap_or(self.index_path);
        self.max_iterations = limits.max_iterations.or(self.max_iterations);
        self
    }

    fn overlay_env(mut self) -> Self {
        self.groq_api_key = env_nonempty("GROQ_API_KEY").or(self.groq_api_key);
        self.tavily_api_key = env_nonempty("TAVILY_API_KEY").or(self.tavily_api_key);
        self.openai_api_key = env_nonempty("OPENAI_API_KEY").or(self.openai_api_key);
        if let Some(v) = env_nonempty("SIFT_CHAT_MODEL") {
            self.chat_model = v;
        }
        if let Some(v) = env_nonempty("SIFT_ROUTER_MODEL") {
            self.router_model = v;
        }
        if let Some(v) = env_nonempty("SIFT_EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Some(v) = env_nonempty("SIFT_CHAT_API_BASE") {
            self.chat_api_base = v;
        }
        if let Some(v) = env_nonempty("SIFT_INDEX_PATH") {
            self.index_path = PathBuf::from(v);
        }
        if let Some(v) = env_nonempty("SIFT_MAX_ITERATIONS") {
            if let Ok(n) = v.parse() {
                self.max_iterations = Some(n);
            }
        }
        self
    }

    /// Checks the mandatory keys. Called at the top of every query so absence
    /// aborts before any node runs.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.groq_api_key.as_deref().map_or(true, str::is_empty) {
            return Err(WorkflowError::Configuration(
                "GROQ_API_KEY is required".to_string(),
            ));
        }
        if self.tavily_api_key.as_deref().map_or(true, str::is_empty) {
            return Err(WorkflowError::Configuration(
                "TAVILY_API_KEY is required".to_string(),
            ));
        }
        if self.openai_api_key.as_deref().map_or(true, str::is_empty) {
            warn!("OPENAI_API_KEY not set; embeddings may not work");
        }
        Ok(())
    }
}
