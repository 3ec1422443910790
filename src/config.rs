use crate::error::{AssessError, Result as AssessResult};
use crate::eval::Cutoff;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    #[serde(default)]
    pub assessment: AssessmentConfig,
}

/// LLM judge configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_judge_base_url")]
    pub base_url: String,
    #[serde(default = "default_judge_model")]
    pub model: String,
    #[serde(default = "default_judge_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout. Unset means the HTTP client's default (none).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_judge_base_url(),
            model: default_judge_model(),
            api_key_env: default_judge_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

/// Reranking service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_reranker_base_url")]
    pub base_url: String,
    #[serde(default = "default_reranker_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: default_reranker_base_url(),
            api_key_env: default_reranker_api_key_env(),
            timeout_secs: None,
        }
    }
}

/// Assessment run defaults
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Number of top documents scored; negative means all.
    #[serde(default = "default_cutoff")]
    pub cutoff: i64,
    #[serde(default = "default_include_docs")]
    pub include_docs: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            cutoff: default_cutoff(),
            include_docs: default_include_docs(),
            log_level: default_log_level(),
        }
    }
}

fn default_judge_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_judge_model() -> String {
    "meta-llama/Llama-3-70b-chat-hf".to_string()
}

fn default_judge_api_key_env() -> String {
    "TOGETHER_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_reranker_base_url() -> String {
    "https://api.joinpongo.com/api/v1".to_string()
}

fn default_reranker_api_key_env() -> String {
    "PONGO_API_KEY".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./assessment.json")
}

fn default_cutoff() -> i64 {
    5
}

fn default_include_docs() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in RANKASSESS_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (built-in defaults if absent)
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config = match std::env::var("RANKASSESS_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    log::debug!("No config.toml found, using built-in defaults");
                    Config::default()
                }
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML config file without validating it
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.judge.base_url)
            .with_context(|| format!("judge.base_url is not a valid URL: {}", self.judge.base_url))?;

        url::Url::parse(&self.reranker.base_url).with_context(|| {
            format!("reranker.base_url is not a valid URL: {}", self.reranker.base_url)
        })?;

        if !(0.0..=2.0).contains(&self.judge.temperature) {
            anyhow::bail!("judge.temperature must be between 0.0 and 2.0");
        }

        if self.judge.timeout_secs == Some(0) {
            anyhow::bail!("judge.timeout_secs must be greater than 0 when set");
        }

        if self.reranker.timeout_secs == Some(0) {
            anyhow::bail!("reranker.timeout_secs must be greater than 0 when set");
        }

        Ok(())
    }

    /// Judge API key from the environment.
    pub fn judge_api_key(&self) -> AssessResult<String> {
        std::env::var(&self.judge.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AssessError::Configuration(format!(
                    "{} not provided. Set it in your .env file or as an environment variable.",
                    self.judge.api_key_env
                ))
            })
    }

    /// Reranker API key, if one is set. No key means no reranker handle.
    pub fn reranker_api_key(&self) -> Option<String> {
        std::env::var(&self.reranker.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn judge_timeout(&self) -> Option<Duration> {
        self.judge.timeout_secs.map(Duration::from_secs)
    }

    pub fn reranker_timeout(&self) -> Option<Duration> {
        self.reranker.timeout_secs.map(Duration::from_secs)
    }

    /// Default scoring cutoff
    pub fn cutoff(&self) -> Cutoff {
        Cutoff::from_raw(self.assessment.cutoff)
    }

    /// Get assessment store path
    pub fn store_path(&self) -> &Path {
        &self.assessment.store_path
    }
}
