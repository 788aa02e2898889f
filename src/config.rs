//! Configuration loading and validation.
//!
//! Loads settings from `$REDPERSONA_CONFIG` or `~/.redpersona/config.toml`.
//! A `.env` file in the working directory is read first, then environment
//! variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::persona::chunk::TruncationStrategy;

// ── Load warnings ───────────────────────────────────────────────

/// A setting skipped while loading, reported once logging is up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    /// An env override whose value does not parse.
    #[error("ignoring invalid env override {var}={value}")]
    InvalidOverride {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
    },
    /// `.env` exists but could not be read.
    #[error("failed to read .env: {0}")]
    DotEnv(String),
}

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Chat completion endpoint settings.
    pub llm: LlmConfig,
    /// Reddit API credentials and fetch limits.
    pub reddit: RedditConfig,
    /// Chunking and truncation limits for a synthesis run.
    pub synthesis: SynthesisConfig,
    /// Rate-limit retry behaviour.
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            llm: LlmConfig::default(),
            reddit: RedditConfig::default(),
            synthesis: SynthesisConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `path` overrides the file location. A missing file yields defaults.
    /// Settings that were skipped come back as [`LoadWarning`]s, since this
    /// runs before logging is set up.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<(Self, Vec<LoadWarning>)> {
        let mut warnings = Vec::new();
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => warnings.push(LoadWarning::DotEnv(e.to_string())),
        }

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path_with(|key| std::env::var(key).ok())?,
        };
        let mut config = Self::load_from_file(&path)?;
        warnings.extend(config.apply_overrides(|key| std::env::var(key).ok()));
        Ok((config, warnings))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config file path using a custom env resolver.
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
        if let Some(p) = env("REDPERSONA_CONFIG") {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    /// Returns one warning per override that could not be applied.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) -> Vec<LoadWarning> {
        let mut warnings = Vec::new();
        if let Some(v) = env("REDPERSONA_LOG_LEVEL") {
            self.log_level = v;
        }

        // LLM.
        if let Some(v) = env("GROQ_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = env("REDPERSONA_LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = env("REDPERSONA_MODEL") {
            self.llm.model = v;
        }

        // Synthesis.
        if let Some(v) = env("MAX_TOTAL_CHUNKS") {
            match v.parse() {
                Ok(n) => self.synthesis.total_chunk_budget = n,
                Err(_) => warnings.push(LoadWarning::InvalidOverride {
                    var: "MAX_TOTAL_CHUNKS",
                    value: v,
                }),
            }
        }

        // Reddit.
        if let Some(v) = env("REDDIT_CLIENT_ID") {
            self.reddit.client_id = Some(v);
        }
        if let Some(v) = env("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = Some(v);
        }
        if let Some(v) = env("REDDIT_USER_AGENT") {
            self.reddit.user_agent = v;
        }

        warnings
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Check the values a synthesis run cannot work without.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.llm.require_api_key()?;
        if self.synthesis.chunk_size == 0 {
            anyhow::bail!("synthesis.chunk_size must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        Ok(())
    }
}

/// Resolve the default config directory (`~/.redpersona/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".redpersona"))
}

// ── LLM config ──────────────────────────────────────────────────

/// Chat completion endpoint settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full URL of the chat completions endpoint.
    pub endpoint: String,
    /// Bearer token for the endpoint.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token cap per call.
    pub max_tokens: u32,
    /// System message sent before every prompt.
    pub system_prompt: String,
}

impl LlmConfig {
    /// Returns the API key or an error when it is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns an error naming the env var to set.
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("missing LLM API key: set GROQ_API_KEY or llm.api_key"))
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "__REDACTED__"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            system_prompt: crate::persona::prompts::ANALYST_PRIMER.to_string(),
        }
    }
}

// ── Reddit config ───────────────────────────────────────────────

/// Reddit script-app credentials and listing limits.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// User-Agent sent with every Reddit request.
    pub user_agent: String,
    /// Maximum posts and maximum comments fetched per user.
    pub fetch_limit: u32,
    /// Upper bound on one Reddit request, including reading the body.
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "__REDACTED__"),
            )
            .field("user_agent", &self.user_agent)
            .field("fetch_limit", &self.fetch_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            user_agent: concat!("redpersona/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_limit: 30,
            request_timeout_secs: 30,
        }
    }
}

// ── Synthesis config ────────────────────────────────────────────

/// Limits for one synthesis run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Total chunk budget, split evenly between posts and comments.
    pub total_chunk_budget: usize,
    /// Items per chunk.
    pub chunk_size: usize,
    /// Character cap on each chunk prompt.
    pub max_prompt_chars: usize,
    /// Character cap on the joined partial summaries.
    pub max_partial_chars: usize,
    /// How prompts over `max_prompt_chars` are cut.
    pub truncation: TruncationStrategy,
}

impl SynthesisConfig {
    /// Per-category item cap (`total_chunk_budget / 2`).
    pub fn half_budget(&self) -> usize {
        self.total_chunk_budget / 2
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            total_chunk_budget: 20,
            chunk_size: 1,
            max_prompt_chars: 18_000,
            max_partial_chars: 16_000,
            truncation: TruncationStrategy::Suffix,
        }
    }
}

// ── Retry config ────────────────────────────────────────────────

/// Rate-limit retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per prompt, including the first.
    pub max_attempts: u32,
    /// Wait used when a rate-limit error carries no hint.
    pub default_wait_secs: f64,
    /// Extra wait added on top of every rate-limit wait.
    pub wait_padding_secs: f64,
    /// Longest single rate-limit wait, padding included. Longer provider
    /// hints are clamped to this.
    pub max_wait_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_wait_secs: 15.0,
            wait_padding_secs: 1.0,
            max_wait_secs: 120.0,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
