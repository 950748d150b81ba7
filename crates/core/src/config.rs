//! Configuration management for DocQA.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - YAML config file (`--config`, `DOCQA_CONFIG`, or `<workspace>/.docqa/config.yaml`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (may contain `.docqa/config.yaml`)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Retrieval and generation pipeline settings
    pub rag: RagConfig,

    /// Generation backends, in preference order
    pub backends: Vec<BackendConfig>,
}

/// Pipeline settings: chunking, indexing, retrieval, context and generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Characters per chunk
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub overlap: usize,

    /// Vocabulary cap for the lexical index
    pub max_features: usize,

    /// (min, max) token n-gram sizes indexed
    pub ngram_range: (usize, usize),

    /// Use `1 + ln(tf)` instead of raw term counts
    pub sublinear_tf: bool,

    /// Max chunks retrieved per query
    pub top_k: usize,

    /// Minimum score to keep a retrieved chunk
    pub similarity_threshold: f32,

    /// Cap on assembled context length, in characters
    pub max_context_chars: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling cutoff
    pub top_p: f32,

    /// Top-k candidate limit during sampling
    pub top_k_sampling: u32,

    /// Maximum output length in tokens
    pub max_output_tokens: u32,

    /// Ordered model preference for backend selection
    pub model_priority_list: Vec<String>,

    /// Generation call deadline
    pub request_timeout_seconds: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            max_features: 500,
            ngram_range: (1, 2),
            sublinear_tf: true,
            top_k: 5,
            similarity_threshold: 0.01,
            max_context_chars: 8000,
            temperature: 0.2,
            top_p: 0.9,
            top_k_sampling: 40,
            max_output_tokens: 1024,
            model_priority_list: vec![
                "claude-3-5-haiku-20241022".to_string(),
                "llama3.2".to_string(),
            ],
            request_timeout_seconds: 60,
        }
    }
}

impl RagConfig {
    /// Reject invalid settings up front. Nothing here is clamped silently.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if self.max_features == 0 {
            return Err(AppError::Config("max_features must be positive".to_string()));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(AppError::Config(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AppError::Config(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.max_context_chars == 0 {
            return Err(AppError::Config(
                "max_context_chars must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(AppError::Config(format!(
                "top_p must be within [0, 1], got {}",
                self.top_p
            )));
        }
        if self.temperature < 0.0 {
            return Err(AppError::Config("temperature must not be negative".to_string()));
        }
        if self.max_output_tokens == 0 {
            return Err(AppError::Config(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One generation backend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider name ("anthropic", "ollama")
    pub provider: String,

    /// Custom endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(
        rename = "apiKeyEnv",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key_env: Option<String>,
}

impl BackendConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            provider: "anthropic".to_string(),
            endpoint: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
        },
        BackendConfig {
            provider: "ollama".to_string(),
            endpoint: Some("http://localhost:11434".to_string()),
            api_key_env: None,
        },
    ]
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    rag: Option<RagConfig>,
    backends: Option<Vec<BackendConfig>>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_format: LogFormat::default(),
            rag: RagConfig::default(),
            backends: default_backends(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file, and environment.
    ///
    /// Environment variables:
    /// - `DOCQA_WORKSPACE`: Override workspace path
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_PROVIDER`: Restrict generation to one provider
    /// - `DOCQA_MODEL`: Preferred model (placed first in the priority list)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    /// - `DOCQA_LOG_FORMAT`: `text` or `json`
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("DOCQA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("DOCQA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".docqa").join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        if let Ok(provider) = std::env::var("DOCQA_PROVIDER") {
            config.restrict_to_provider(&provider);
        }

        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            config.prefer_model(model);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        if let Ok(format) = std::env::var("DOCQA_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.rag.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit YAML file on top of defaults.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let config = Self {
            config_file: Some(path.to_path_buf()),
            ..Self::default()
        };
        let config = config.merge_yaml(path)?;
        config.rag.validate()?;
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);

        let mut result = self.clone();

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        if let Some(backends) = config_file.backends {
            result.backends = backends;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the config file and environment.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> AppResult<Self> {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            if self.config_file.as_ref() != Some(&config_file) {
                self = self.merge_yaml(&config_file)?;
            }
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.restrict_to_provider(&provider);
        }

        if let Some(model) = model {
            self.prefer_model(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self.rag.validate()?;
        Ok(self)
    }

    /// Keep only backends of the given provider, adding a default entry if none is configured.
    fn restrict_to_provider(&mut self, provider: &str) {
        let provider = provider.to_lowercase();
        self.backends.retain(|b| b.provider.eq_ignore_ascii_case(&provider));
        if self.backends.is_empty() {
            self.backends.push(BackendConfig {
                provider,
                endpoint: None,
                api_key_env: None,
            });
        }
    }

    /// Put a model at the head of the priority list.
    fn prefer_model(&mut self, model: String) {
        self.rag.model_priority_list.retain(|m| m != &model);
        self.rag.model_priority_list.insert(0, model);
    }
}
